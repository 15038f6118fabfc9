use std::ops::Mul;

use rabe_bn::Fr;
use sha3::{Digest, Sha3_256};

use crate::error::AbeError;

/// Hashes `data` into the scalar field and multiplies the base element by
/// it, i.e. `g * H(data)`. Usable with a [`rabe_bn::G1`] or [`rabe_bn::G2`]
/// base.
pub fn sha3_hash<T: Mul<Fr, Output = T>>(g: T, data: &str) -> Result<T, AbeError> {
    let mut hasher = Sha3_256::new();
    hasher.update(data.as_bytes());
    match Fr::from_slice(&hasher.finalize()) {
        Ok(fr) => Ok(g * fr),
        Err(e) => Err(e.into()),
    }
}
