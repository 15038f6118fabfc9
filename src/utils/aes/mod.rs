//! Symmetric layer of the hybrid construction: AES-256-GCM keyed by the
//! SHA3-256 digest of the key source's byte encoding. The random 96 bit
//! nonce is prepended to the ciphertext.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead},
    Aes256Gcm, KeyInit, Nonce,
};
use rand::Rng;
use serde::Serialize;
use sha3::{Digest, Sha3_256};

use crate::error::AbeError;

const NONCE_LEN: usize = 12;

// 32 byte AES key from the byte encoding of the key source
fn kdf<T: Serialize>(key_source: &T) -> Result<Vec<u8>, AbeError> {
    let encoded = bincode::serialize(key_source)?;
    let mut hasher = Sha3_256::new();
    hasher.update(&encoded);
    Ok(hasher.finalize().to_vec())
}

/// Encrypts `plaintext` under a key derived from `key_source`.
pub fn encrypt_symmetric<T: Serialize>(
    key_source: &T,
    plaintext: &[u8],
) -> Result<Vec<u8>, AbeError> {
    let key = kdf(key_source)?;
    let cipher = Aes256Gcm::new(GenericArray::from_slice(&key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let mut ct = cipher.encrypt(nonce, plaintext)?;
    let mut ret = nonce_bytes.to_vec();
    ret.append(&mut ct);
    Ok(ret)
}

/// Decrypts a `nonce || ciphertext || tag` blob produced by
/// [`encrypt_symmetric`]. Fails with a decryption error when the tag does
/// not verify, which covers both tampering and a wrong derived key.
pub fn decrypt_symmetric<T: Serialize>(
    key_source: &T,
    nonce_ct: &[u8],
) -> Result<Vec<u8>, AbeError> {
    if nonce_ct.len() < NONCE_LEN {
        return Err(AbeError::decryption("ciphertext too short"));
    }
    let key = kdf(key_source)?;
    let cipher = Aes256Gcm::new(GenericArray::from_slice(&key));
    let (nonce_bytes, ct) = nonce_ct.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ct)
        .map_err(|e| e.into())
}
