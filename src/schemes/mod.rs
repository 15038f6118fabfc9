//! The implemented attribute-based schemes.
pub mod rw13;
