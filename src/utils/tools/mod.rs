use rabe_bn::Fr;

/// Lifts a small integer into the scalar field.
pub fn usize_to_fr(i: usize) -> Fr {
    // decimal digits are always a valid field element string
    Fr::from_str(&i.to_string()).unwrap()
}

/// Checks whether `value` occurs in `data`.
pub fn contains(data: &[String], value: &str) -> bool {
    data.iter().any(|entry| entry == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usize_to_fr() {
        assert_eq!(usize_to_fr(0), Fr::zero());
        assert_eq!(usize_to_fr(1), Fr::one());
        assert_eq!(usize_to_fr(2), Fr::one() + Fr::one());
    }

    #[test]
    fn test_contains() {
        let data = vec![String::from("A"), String::from("B")];
        assert!(contains(&data, "A"));
        assert!(!contains(&data, "a"));
        assert!(!contains(&data, "C"));
    }
}
