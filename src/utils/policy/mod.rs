//! Access policy handling: the textual policy language and its
//! compilation into a monotone span program.
pub mod human;
pub mod msp;
