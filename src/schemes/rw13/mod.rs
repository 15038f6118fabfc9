//! `RW13` large-universe ABE by Yannis Rouselakis and Brent Waters.
//!
//! * Developed in "Practical Constructions and New Proof Methods for Large Universe Attribute-Based Encryption"
//! * Published in Proceedings of the 2013 ACM SIGSAC Conference on Computer and Communications Security
//! * Available from <https://eprint.iacr.org/2012/583.pdf>
//! * Type: key encapsulation + hybrid encryption (attribute-based)
//! * Setting: bilinear groups (asymmetric), prime order, large attribute universe
//!
//! Both orientations of the construction live in this module: the
//! ciphertext-policy functions (`cp_*`) attach the access policy to the
//! header and the attribute set to the key, the key-policy functions
//! (`kp_*`) do the inverse. Attribute labels are hashed into the scalar
//! field, so the universe is unbounded and setup needs no attribute count.
//!
//! # Examples
//!
//! A CP-ABE example:
//!
//! ```
//! use rwabe::schemes::rw13::*;
//! use rwabe::utils::params::PairingDescriptor;
//! let descriptor = PairingDescriptor::default();
//! let (pk, msk) = setup(&descriptor).unwrap();
//! let plaintext = b"our plaintext!".to_vec();
//! let sk = cp_keygen(&pk, &msk, &["A_0", "A_1"]).unwrap();
//! let ct = cp_encrypt(&pk, "A_0 AND A_1", &plaintext).unwrap();
//! assert_eq!(cp_decrypt(&sk, &ct).unwrap(), plaintext);
//! ```
//!
//! A KP-ABE example:
//!
//! ```
//! use rwabe::schemes::rw13::*;
//! use rwabe::utils::params::PairingDescriptor;
//! let descriptor = PairingDescriptor::default();
//! let (pk, msk) = setup(&descriptor).unwrap();
//! let plaintext = b"our plaintext!".to_vec();
//! let sk = kp_keygen(&pk, &msk, "A_0 AND A_1").unwrap();
//! let ct = kp_encrypt(&pk, &["A_0", "A_1"], &plaintext).unwrap();
//! assert_eq!(kp_decrypt(&sk, &ct).unwrap(), plaintext);
//! ```

use std::ops::Neg;

use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AbeError, ErrorKind};
use crate::utils::aes::{decrypt_symmetric, encrypt_symmetric};
use crate::utils::hash::sha3_hash;
use crate::utils::params::PairingDescriptor;
use crate::utils::policy::human::parse;
use crate::utils::policy::msp::AbePolicy;
use crate::utils::secretsharing::{calc_coefficients, gen_shares};

/// An RW13 Public Key (PK)
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13PublicKey {
    pub g1: G1,
    pub g2: G2,
    pub u: G1,
    pub h: G1,
    pub w: G1,
    pub v: G1,
    pub e_gg_alpha: Gt,
}

/// An RW13 Master Key (MSK), held only by the key generation authority.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13MasterKey {
    pub alpha: Fr,
}

/// The session key recovered by decapsulation, `e(g1, g2)^(alpha * s)`.
///
/// Deliberately not serializable: it only exists to key the symmetric
/// layer and never travels or persists itself.
#[derive(Clone, PartialEq, Debug)]
pub struct SessionKey(Gt);

/// An RW13 CP-ABE Secret Key (SK), bound to a flat attribute set.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13CpSecretKey {
    pub attributes: Vec<String>,
    pub k_0: G1,
    pub k_1: G2,
    /// per attribute: (label, `g2 * r_x`, `(u * H(x) + h) * r_x - v * r`)
    pub k_attr: Vec<(String, G2, G1)>,
}

/// An RW13 CP-ABE Header, bound to an access policy. Together with the
/// session key it forms the output of [`cp_encapsulate`].
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13CpHeader {
    pub policy: String,
    pub c_0: G2,
    /// per policy row: (attribute, `w * lambda_i + v * t_i`,
    /// `-(u * H(rho_i) + h) * t_i`, `g2 * t_i`)
    pub c_rows: Vec<(String, G1, G1, G2)>,
}

/// An RW13 CP-ABE hybrid ciphertext: a header plus the symmetric
/// ciphertext of the message under the encapsulated session key.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13CpCiphertext {
    pub header: Rw13CpHeader,
    pub ct: Vec<u8>,
}

/// An RW13 KP-ABE Secret Key (SK), bound to an access policy.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13KpSecretKey {
    pub policy: String,
    /// per policy row: (attribute, `g1 * lambda_i + w * t_i`,
    /// `-(u * H(rho_i) + h) * t_i`, `g2 * t_i`)
    pub k_rows: Vec<(String, G1, G1, G2)>,
}

/// An RW13 KP-ABE Header, bound to a flat attribute set.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13KpHeader {
    pub attributes: Vec<String>,
    pub c_0: G2,
    /// per attribute: (label, `g2 * r_x`, `(u * H(x) + h) * r_x - w * s`)
    pub c_attr: Vec<(String, G2, G1)>,
}

/// An RW13 KP-ABE hybrid ciphertext.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Rw13KpCiphertext {
    pub header: Rw13KpHeader,
    pub ct: Vec<u8>,
}

impl SessionKey {
    pub(crate) fn raw(&self) -> &Gt {
        &self.0
    }
}

/// The setup algorithm of both orientations. Generates an [`Rw13PublicKey`]
/// and an [`Rw13MasterKey`] after validating the pairing descriptor.
pub fn setup(
    descriptor: &PairingDescriptor,
) -> Result<(Rw13PublicKey, Rw13MasterKey), AbeError> {
    descriptor.validate()?;
    let mut rng = rand::thread_rng();
    let g1: G1 = rng.gen();
    let g2: G2 = rng.gen();
    let u: G1 = rng.gen();
    let h: G1 = rng.gen();
    let w: G1 = rng.gen();
    let v: G1 = rng.gen();
    let alpha: Fr = rng.gen();
    let e_gg_alpha = pairing(g1, g2).pow(alpha);
    Ok((
        Rw13PublicKey {
            g1,
            g2,
            u,
            h,
            w,
            v,
            e_gg_alpha,
        },
        Rw13MasterKey { alpha },
    ))
}

// the large-universe attribute base, u * H(attribute) + h
fn attribute_base(pk: &Rw13PublicKey, attribute: &str) -> Result<G1, AbeError> {
    Ok(sha3_hash(pk.u, attribute)? + pk.h)
}

/// The key generation algorithm of RW13 CP-ABE. Generates an
/// [`Rw13CpSecretKey`] for a set of attributes.
///
/// # Arguments
///
/// * `pk` - A Public Key (PK), generated by [`setup`]
/// * `msk` - A Master Key (MSK), generated by [`setup`]
/// * `attributes` - the attributes assigned to this user key
pub fn cp_keygen(
    pk: &Rw13PublicKey,
    msk: &Rw13MasterKey,
    attributes: &[&str],
) -> Result<Rw13CpSecretKey, AbeError> {
    if attributes.is_empty() {
        return Err(AbeError::invalid_attribute("empty attribute set"));
    }
    let mut rng = rand::thread_rng();
    let r: Fr = rng.gen();
    let k_0 = (pk.g1 * msk.alpha) + (pk.w * r);
    let k_1 = pk.g2 * r;
    let mut k_attr: Vec<(String, G2, G1)> = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let r_x: Fr = rng.gen();
        let base = attribute_base(pk, attribute)?;
        k_attr.push((
            attribute.to_string(),
            pk.g2 * r_x,
            (base * r_x) - (pk.v * r),
        ));
    }
    Ok(Rw13CpSecretKey {
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
        k_0,
        k_1,
        k_attr,
    })
}

/// The encapsulation algorithm of RW13 CP-ABE. Compiles the policy into its
/// LSSS form, shares a fresh secret `s` along it and returns the header
/// together with the session key `e(g1, g2)^(alpha * s)`.
///
/// # Arguments
///
/// * `pk` - A Public Key (PK), generated by [`setup`]
/// * `policy` - An access policy given as policy text
pub fn cp_encapsulate(
    pk: &Rw13PublicKey,
    policy: &str,
) -> Result<(Rw13CpHeader, SessionKey), AbeError> {
    let pol = parse(policy)?;
    let msp = AbePolicy::from_policy(&pol)?;
    let mut rng = rand::thread_rng();
    let s: Fr = rng.gen();
    let lambda = gen_shares(s, &msp);
    let c_0 = pk.g2 * s;
    let mut c_rows: Vec<(String, G1, G1, G2)> = Vec::with_capacity(msp.m.len());
    for (i, attribute) in msp.rho.iter().enumerate() {
        let t_i: Fr = rng.gen();
        let base = attribute_base(pk, attribute)?;
        c_rows.push((
            attribute.clone(),
            (pk.w * lambda[i]) + (pk.v * t_i),
            base * t_i.neg(),
            pk.g2 * t_i,
        ));
    }
    Ok((
        Rw13CpHeader {
            policy: policy.to_string(),
            c_0,
            c_rows,
        },
        SessionKey(pk.e_gg_alpha.pow(s)),
    ))
}

/// The decapsulation algorithm of RW13 CP-ABE. Recompiles the header's
/// policy (compilation is deterministic, so rows line up), solves for
/// reconstruction coefficients over the rows covered by the key's
/// attributes and recombines the pairings into the session key.
///
/// Fails with an attribute-mismatch error when the key does not satisfy
/// the header's policy.
pub fn cp_decapsulate(
    sk: &Rw13CpSecretKey,
    header: &Rw13CpHeader,
) -> Result<SessionKey, AbeError> {
    let pol = parse(&header.policy)?;
    let msp = AbePolicy::from_policy(&pol)?;
    if msp.m.len() != header.c_rows.len() {
        return Err(AbeError::malformed_element(
            "header rows do not match its policy",
        ));
    }
    let coefficients = calc_coefficients(&msp, &sk.attributes)?;
    let mut denominator = Gt::one();
    for (row, omega) in coefficients {
        let (ref attribute, c_1, c_2, c_3) = header.c_rows[row];
        let (k_2, k_3) = sk
            .k_attr
            .iter()
            .find(|entry| &entry.0 == attribute)
            .map(|entry| (entry.1, entry.2))
            .ok_or_else(|| {
                AbeError::attribute_mismatch("key is missing a component for a matched attribute")
            })?;
        denominator = denominator
            * (pairing(c_1, sk.k_1) * pairing(c_2, k_2) * pairing(k_3, c_3)).pow(omega);
    }
    Ok(SessionKey(
        pairing(sk.k_0, header.c_0) * denominator.inverse(),
    ))
}

/// The hybrid encrypt algorithm of RW13 CP-ABE: encapsulates a session key
/// under the policy and symmetrically encrypts the plaintext under it.
pub fn cp_encrypt(
    pk: &Rw13PublicKey,
    policy: &str,
    plaintext: &[u8],
) -> Result<Rw13CpCiphertext, AbeError> {
    let (header, key) = cp_encapsulate(pk, policy)?;
    let ct = encrypt_symmetric(key.raw(), plaintext)?;
    Ok(Rw13CpCiphertext { header, ct })
}

/// The hybrid decrypt algorithm of RW13 CP-ABE.
///
/// An unsatisfied policy and a tampered ciphertext both surface as the
/// same decryption error, so callers cannot be used as a policy
/// satisfaction oracle.
pub fn cp_decrypt(sk: &Rw13CpSecretKey, ct: &Rw13CpCiphertext) -> Result<Vec<u8>, AbeError> {
    let key = cp_decapsulate(sk, &ct.header).map_err(collapse_mismatch)?;
    decrypt_symmetric(key.raw(), &ct.ct)
}

/// The key generation algorithm of RW13 KP-ABE. Compiles the policy into
/// its LSSS form, shares the master secret `alpha` along it and emits one
/// key component triple per policy row.
///
/// # Arguments
///
/// * `pk` - A Public Key (PK), generated by [`setup`]
/// * `msk` - A Master Key (MSK), generated by [`setup`]
/// * `policy` - the access policy embedded into this user key
pub fn kp_keygen(
    pk: &Rw13PublicKey,
    msk: &Rw13MasterKey,
    policy: &str,
) -> Result<Rw13KpSecretKey, AbeError> {
    let pol = parse(policy)?;
    let msp = AbePolicy::from_policy(&pol)?;
    let mut rng = rand::thread_rng();
    let lambda = gen_shares(msk.alpha, &msp);
    let mut k_rows: Vec<(String, G1, G1, G2)> = Vec::with_capacity(msp.m.len());
    for (i, attribute) in msp.rho.iter().enumerate() {
        let t_i: Fr = rng.gen();
        let base = attribute_base(pk, attribute)?;
        k_rows.push((
            attribute.clone(),
            (pk.g1 * lambda[i]) + (pk.w * t_i),
            base * t_i.neg(),
            pk.g2 * t_i,
        ));
    }
    Ok(Rw13KpSecretKey {
        policy: policy.to_string(),
        k_rows,
    })
}

/// The encapsulation algorithm of RW13 KP-ABE. Binds the header to a flat
/// attribute set and returns it with the session key.
pub fn kp_encapsulate(
    pk: &Rw13PublicKey,
    attributes: &[&str],
) -> Result<(Rw13KpHeader, SessionKey), AbeError> {
    if attributes.is_empty() {
        return Err(AbeError::invalid_attribute("empty attribute set"));
    }
    let mut rng = rand::thread_rng();
    let s: Fr = rng.gen();
    let c_0 = pk.g2 * s;
    let mut c_attr: Vec<(String, G2, G1)> = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let r_x: Fr = rng.gen();
        let base = attribute_base(pk, attribute)?;
        c_attr.push((
            attribute.to_string(),
            pk.g2 * r_x,
            (base * r_x) - (pk.w * s),
        ));
    }
    Ok((
        Rw13KpHeader {
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            c_0,
            c_attr,
        },
        SessionKey(pk.e_gg_alpha.pow(s)),
    ))
}

/// The decapsulation algorithm of RW13 KP-ABE, dual to [`cp_decapsulate`]:
/// the policy comes from the key, the attributes from the header.
pub fn kp_decapsulate(
    sk: &Rw13KpSecretKey,
    header: &Rw13KpHeader,
) -> Result<SessionKey, AbeError> {
    let pol = parse(&sk.policy)?;
    let msp = AbePolicy::from_policy(&pol)?;
    if msp.m.len() != sk.k_rows.len() {
        return Err(AbeError::malformed_element(
            "key rows do not match its policy",
        ));
    }
    let coefficients = calc_coefficients(&msp, &header.attributes)?;
    let mut b = Gt::one();
    for (row, omega) in coefficients {
        let (ref attribute, k_0, k_1, k_2) = sk.k_rows[row];
        let (c_1, c_2) = header
            .c_attr
            .iter()
            .find(|entry| &entry.0 == attribute)
            .map(|entry| (entry.1, entry.2))
            .ok_or_else(|| {
                AbeError::attribute_mismatch("header is missing a component for a matched attribute")
            })?;
        b = b * (pairing(k_0, header.c_0) * pairing(k_1, c_1) * pairing(c_2, k_2)).pow(omega);
    }
    Ok(SessionKey(b))
}

/// The hybrid encrypt algorithm of RW13 KP-ABE.
pub fn kp_encrypt(
    pk: &Rw13PublicKey,
    attributes: &[&str],
    plaintext: &[u8],
) -> Result<Rw13KpCiphertext, AbeError> {
    let (header, key) = kp_encapsulate(pk, attributes)?;
    let ct = encrypt_symmetric(key.raw(), plaintext)?;
    Ok(Rw13KpCiphertext { header, ct })
}

/// The hybrid decrypt algorithm of RW13 KP-ABE.
pub fn kp_decrypt(sk: &Rw13KpSecretKey, ct: &Rw13KpCiphertext) -> Result<Vec<u8>, AbeError> {
    let key = kp_decapsulate(sk, &ct.header).map_err(collapse_mismatch)?;
    decrypt_symmetric(key.raw(), &ct.ct)
}

// hybrid decryption must not distinguish "policy not satisfied" from a
// failed authentication tag towards its caller
fn collapse_mismatch(e: AbeError) -> AbeError {
    if e.kind() == ErrorKind::AttributeMismatch {
        AbeError::decryption("could not recover the session key")
    } else {
        e
    }
}
