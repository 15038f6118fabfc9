//! Supporting layers of the schemes: symmetric hybrid encryption, hashing
//! into the groups, policy handling, linear secret sharing and the
//! storable parameter forms.
pub mod aes;
pub mod hash;
pub mod params;
pub mod policy;
pub mod secretsharing;
pub mod tools;
