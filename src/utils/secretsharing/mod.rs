//! Linear secret sharing over an [`AbePolicy`] matrix: share generation for
//! keygen/encapsulation and reconstruction-coefficient recovery for
//! decapsulation.
//!
//! Reconstruction solves `sum_i omega_i * M_i = (1, 0, ..., 0)` over the
//! rows whose attribute is available, by Gaussian elimination over `Fr` --
//! never by trying subsets. Any valid coefficient set recovers the same
//! secret, so the first basis the elimination produces is used as is.

use rabe_bn::Fr;
use rand::Rng;

use crate::error::AbeError;
use crate::utils::policy::msp::AbePolicy;
use crate::utils::tools::contains;

/// Computes the share vector `lambda = M * y` with `y = (secret, y_2, ...,
/// y_n)` and fresh randomness for every call. One share per matrix row.
pub fn gen_shares(secret: Fr, msp: &AbePolicy) -> Vec<Fr> {
    let mut rng = rand::thread_rng();
    let mut y: Vec<Fr> = Vec::with_capacity(msp.cols);
    y.push(secret);
    for _ in 1..msp.cols {
        y.push(rng.gen());
    }
    msp.m
        .iter()
        .map(|row| {
            row.iter()
                .zip(y.iter())
                .fold(Fr::zero(), |acc, (m, yj)| acc + (*m * *yj))
        })
        .collect()
}

/// Indices of the matrix rows whose attribute occurs in `attributes`,
/// in row order.
pub fn available_rows(msp: &AbePolicy, attributes: &[String]) -> Vec<usize> {
    msp.rho
        .iter()
        .enumerate()
        .filter(|(_, attr)| contains(attributes, attr))
        .map(|(i, _)| i)
        .collect()
}

/// Solves for reconstruction coefficients over the rows available to the
/// given attributes. Returns `(row index, omega)` pairs with non-zero
/// coefficients, or an attribute-mismatch error when the attributes do not
/// satisfy the policy.
pub fn calc_coefficients(
    msp: &AbePolicy,
    attributes: &[String],
) -> Result<Vec<(usize, Fr)>, AbeError> {
    let rows = available_rows(msp, attributes);
    if rows.is_empty() {
        return Err(AbeError::attribute_mismatch(
            "no policy row matches the given attributes",
        ));
    }
    // one equation per matrix column: M_sel^T * omega = e_1
    let mut a: Vec<Vec<Fr>> = (0..msp.cols)
        .map(|col| rows.iter().map(|&r| msp.m[r][col]).collect())
        .collect();
    let mut b: Vec<Fr> = vec![Fr::zero(); msp.cols];
    b[0] = Fr::one();
    match solve(&mut a, &mut b, rows.len()) {
        Some(omega) => Ok(rows
            .into_iter()
            .zip(omega)
            .filter(|(_, w)| *w != Fr::zero())
            .collect()),
        None => Err(AbeError::attribute_mismatch(
            "attributes do not satisfy the policy",
        )),
    }
}

/// Recombines shares with the coefficients for the given attributes.
pub fn recover_secret(
    msp: &AbePolicy,
    shares: &[Fr],
    attributes: &[String],
) -> Result<Fr, AbeError> {
    let coefficients = calc_coefficients(msp, attributes)?;
    Ok(coefficients
        .iter()
        .fold(Fr::zero(), |acc, (row, omega)| {
            acc + (*omega * shares[*row])
        }))
}

// Gauss-Jordan elimination over Fr. `a` holds one equation per entry, each
// of length `unknowns`; `b` is the right hand side. Free unknowns are fixed
// to zero; an inconsistent system yields None.
fn solve(a: &mut Vec<Vec<Fr>>, b: &mut Vec<Fr>, unknowns: usize) -> Option<Vec<Fr>> {
    let equations = a.len();
    let mut pivot_of: Vec<Option<usize>> = vec![None; unknowns];
    let mut rank = 0;
    for col in 0..unknowns {
        if rank == equations {
            break;
        }
        let pivot = match (rank..equations).find(|&r| a[r][col] != Fr::zero()) {
            Some(p) => p,
            None => continue,
        };
        a.swap(rank, pivot);
        b.swap(rank, pivot);
        // normalize, matrix entries are non-zero so the inverse exists
        let inv = a[rank][col].inverse().unwrap();
        for c in col..unknowns {
            a[rank][c] = a[rank][c] * inv;
        }
        b[rank] = b[rank] * inv;
        for r in 0..equations {
            if r != rank && a[r][col] != Fr::zero() {
                let factor = a[r][col];
                for c in col..unknowns {
                    a[r][c] = a[r][c] - (factor * a[rank][c]);
                }
                b[r] = b[r] - (factor * b[rank]);
            }
        }
        pivot_of[col] = Some(rank);
        rank += 1;
    }
    // every remaining equation row is all zero; a non-zero right hand side
    // there means the target vector is not in the row span
    for r in rank..equations {
        if b[r] != Fr::zero() {
            return None;
        }
    }
    let mut omega = vec![Fr::zero(); unknowns];
    for col in 0..unknowns {
        if let Some(r) = pivot_of[col] {
            omega[col] = b[r];
        }
    }
    Some(omega)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(attrs: &[&str]) -> Vec<String> {
        attrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_secret_sharing_and() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let msp = AbePolicy::from_language("A AND B").unwrap();
        let shares = gen_shares(secret, &msp);
        assert_eq!(shares.len(), 2);
        let recovered = recover_secret(&msp, &shares, &labels(&["A", "B"])).unwrap();
        assert_eq!(secret, recovered);
        // a single attribute must not reconstruct
        let e = recover_secret(&msp, &shares, &labels(&["A"])).unwrap_err();
        assert_eq!(e.kind(), crate::error::ErrorKind::AttributeMismatch);
    }

    #[test]
    fn test_secret_sharing_or() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let msp = AbePolicy::from_language("A OR B").unwrap();
        let shares = gen_shares(secret, &msp);
        let from_a = recover_secret(&msp, &shares, &labels(&["A"])).unwrap();
        let from_b = recover_secret(&msp, &shares, &labels(&["B"])).unwrap();
        assert_eq!(secret, from_a);
        assert_eq!(secret, from_b);
    }

    #[test]
    fn test_secret_sharing_threshold() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let msp = AbePolicy::from_language("2 OF (A, B, C)").unwrap();
        let shares = gen_shares(secret, &msp);
        assert_eq!(recover_secret(&msp, &shares, &labels(&["A", "C"])).unwrap(), secret);
        assert_eq!(recover_secret(&msp, &shares, &labels(&["B", "C"])).unwrap(), secret);
        assert!(recover_secret(&msp, &shares, &labels(&["B"])).is_err());
    }

    #[test]
    fn oversets_recover_the_same_secret() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let msp = AbePolicy::from_language("(A AND B) OR (C AND D)").unwrap();
        let shares = gen_shares(secret, &msp);
        let exact = recover_secret(&msp, &shares, &labels(&["A", "B"])).unwrap();
        let overset = recover_secret(&msp, &shares, &labels(&["A", "B", "C", "D"])).unwrap();
        assert_eq!(exact, secret);
        assert_eq!(overset, secret);
    }

    #[test]
    fn nested_policy() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let msp = AbePolicy::from_language("A AND (B OR (C AND D))").unwrap();
        let shares = gen_shares(secret, &msp);
        assert_eq!(recover_secret(&msp, &shares, &labels(&["A", "B"])).unwrap(), secret);
        assert_eq!(recover_secret(&msp, &shares, &labels(&["A", "C", "D"])).unwrap(), secret);
        assert!(recover_secret(&msp, &shares, &labels(&["A", "C"])).is_err());
        assert!(recover_secret(&msp, &shares, &labels(&["B", "C", "D"])).is_err());
    }
}
