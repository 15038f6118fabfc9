//! Compilation of a parsed access policy into its linear secret sharing
//! structure: a matrix `m` over `Fr` with one row per policy leaf (in
//! left-to-right leaf order) and the row-to-attribute map `rho`.
//!
//! Compilation is deterministic: encryptor and decryptor derive the exact
//! same `(m, rho)` from the same policy text, which is what lets key rows
//! and ciphertext rows line up across parties.

use std::ops::Neg;

use rabe_bn::Fr;

use crate::error::AbeError;
use crate::utils::policy::human::{parse, PolicyValue};
use crate::utils::tools::usize_to_fr;

/// The monotone span program of an access policy.
///
/// An attribute set satisfies the policy iff some combination of the rows
/// belonging to its attributes spans `(1, 0, ..., 0)`.
#[derive(Clone, PartialEq, Debug)]
pub struct AbePolicy {
    /// share-generating matrix, one row per leaf, all rows of length `cols`
    pub m: Vec<Vec<Fr>>,
    /// attribute label of each row
    pub rho: Vec<String>,
    /// share vector dimension
    pub cols: usize,
}

impl AbePolicy {
    /// Parses and compiles policy text in one step.
    pub fn from_language(content: &str) -> Result<AbePolicy, AbeError> {
        parse(content).and_then(|pol| AbePolicy::from_policy(&pol))
    }

    /// Compiles a parsed policy tree into its LSSS matrix.
    pub fn from_policy(policy: &PolicyValue) -> Result<AbePolicy, AbeError> {
        let mut msp = AbePolicy {
            m: Vec::new(),
            rho: Vec::new(),
            cols: 1,
        };
        msp.assign(policy, vec![Fr::one()])?;
        for row in &mut msp.m {
            row.resize(msp.cols, Fr::zero());
        }
        Ok(msp)
    }

    // Vector assignment, top down. Every gate extends the matrix width and
    // hands each child a vector whose shares reconstruct the parent's:
    // OR replicates the parent vector, AND appends n-1 columns so the child
    // shares sum back to the parent, k OF n appends k-1 columns carrying the
    // Shamir evaluation points j, j^2, ..., j^(k-1).
    fn assign(&mut self, node: &PolicyValue, v: Vec<Fr>) -> Result<(), AbeError> {
        match node {
            PolicyValue::Leaf(attr) => {
                self.m.push(v);
                self.rho.push(attr.clone());
                Ok(())
            }
            PolicyValue::Or(children) => {
                for child in children {
                    self.assign(child, v.clone())?;
                }
                Ok(())
            }
            PolicyValue::And(children) => {
                if children.is_empty() {
                    return Err(AbeError::policy_syntax("empty AND clause"));
                }
                let n = children.len();
                let base = self.cols;
                self.cols += n - 1;
                let mut first = v;
                first.resize(base, Fr::zero());
                for _ in 1..n {
                    first.push(Fr::one());
                }
                self.assign(&children[0], first)?;
                for j in 1..n {
                    let mut vj = vec![Fr::zero(); base + j];
                    vj[base + j - 1] = Fr::one().neg();
                    self.assign(&children[j], vj)?;
                }
                Ok(())
            }
            PolicyValue::Threshold(k, children) => {
                let base = self.cols;
                self.cols += k - 1;
                for (j, child) in children.iter().enumerate() {
                    let point = usize_to_fr(j + 1);
                    let mut vj = v.clone();
                    vj.resize(base, Fr::zero());
                    let mut power = Fr::one();
                    for _ in 1..*k {
                        power = power * point;
                        vj.push(power);
                    }
                    self.assign(child, vj)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_order_and_dimensions() {
        let msp = AbePolicy::from_language("A AND (B OR C)").unwrap();
        assert_eq!(msp.rho, vec!["A", "B", "C"]);
        assert_eq!(msp.m.len(), 3);
        assert_eq!(msp.cols, 2);
        for row in &msp.m {
            assert_eq!(row.len(), 2);
        }
        // A carries the parent vector plus the AND column, B and C share the
        // complementary column vector
        assert_eq!(msp.m[0], vec![Fr::one(), Fr::one()]);
        assert_eq!(msp.m[1], msp.m[2]);
    }

    #[test]
    fn nary_and() {
        let msp = AbePolicy::from_language("A AND B AND C").unwrap();
        assert_eq!(msp.m.len(), 3);
        assert_eq!(msp.cols, 3);
        // child rows sum to (1, 0, 0)
        let mut sum = vec![Fr::zero(); 3];
        for row in &msp.m {
            for (c, val) in row.iter().enumerate() {
                sum[c] = sum[c] + *val;
            }
        }
        assert_eq!(sum, vec![Fr::one(), Fr::zero(), Fr::zero()]);
    }

    #[test]
    fn threshold_dimensions() {
        let msp = AbePolicy::from_language("2 OF (A, B, C)").unwrap();
        assert_eq!(msp.m.len(), 3);
        assert_eq!(msp.cols, 2);
        assert_eq!(msp.rho, vec!["A", "B", "C"]);
        // row j is (1, j)
        assert_eq!(msp.m[1], vec![Fr::one(), usize_to_fr(2)]);
    }

    #[test]
    fn compilation_is_deterministic() {
        let text = "(A_0 AND A_1) OR 2 OF (A_2, A_3, A_4)";
        let a = AbePolicy::from_language(text).unwrap();
        let b = AbePolicy::from_language(text).unwrap();
        assert_eq!(a, b);
    }
}
