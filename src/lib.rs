//! A rust library implementing the Rouselakis-Waters large-universe
//! attribute-based encryption scheme in both its ciphertext-policy and
//! key-policy orientation, as a key encapsulation mechanism with an
//! AES-256-GCM hybrid layer on top.
//!
//! Policies are given in a human readable language (`"A AND (B OR C)"`,
//! `"2 OF (A, B, C)"`) and compiled into monotone span programs. The
//! attribute universe is unbounded: labels are hashed into the scalar
//! field, so setup takes no attribute list.
//!
//! - see [`schemes::rw13`] for the scheme algorithms,
//! - see [`utils::params`] for the storable parameter forms,
//! - see [`error`] for the error taxonomy callers branch on.
//!
//! # Example (CP-ABE)
//!
//! ```
//! use rwabe::schemes::rw13::{setup, cp_keygen, cp_encrypt, cp_decrypt};
//! use rwabe::utils::params::PairingDescriptor;
//!
//! let descriptor = PairingDescriptor::default();
//! let (pk, msk) = setup(&descriptor).unwrap();
//! let sk = cp_keygen(&pk, &msk, &["A_0", "A_1"]).unwrap();
//! let ct = cp_encrypt(&pk, "A_0 AND A_1", b"our plaintext!").unwrap();
//! assert_eq!(cp_decrypt(&sk, &ct).unwrap(), b"our plaintext!".to_vec());
//! ```
//!
//! # Example (KP-ABE)
//!
//! ```
//! use rwabe::schemes::rw13::{setup, kp_keygen, kp_encrypt, kp_decrypt};
//! use rwabe::utils::params::PairingDescriptor;
//!
//! let descriptor = PairingDescriptor::default();
//! let (pk, msk) = setup(&descriptor).unwrap();
//! let sk = kp_keygen(&pk, &msk, "A_0 OR A_1").unwrap();
//! let ct = kp_encrypt(&pk, &["A_1"], b"our plaintext!").unwrap();
//! assert_eq!(kp_decrypt(&sk, &ct).unwrap(), b"our plaintext!".to_vec());
//! ```

pub mod error;
pub mod schemes;
pub mod utils;
