use std::{
    cmp,
    fmt::{Display, Formatter, Result as FmtResult},
};

use pest::error::{Error as PestError, LineColLocation};
use rabe_bn::FieldError;

use crate::utils::policy::human::Rule;

/// What went wrong. Callers are expected to branch on this: an
/// [`AttributeMismatch`](ErrorKind::AttributeMismatch) is a normal
/// control-flow outcome of decapsulation, while a
/// [`MalformedElement`](ErrorKind::MalformedElement) points at corrupted or
/// tampered storage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Malformed policy text (unbalanced parentheses, dangling operator,
    /// duplicate attribute in a clause, ...).
    PolicySyntax,
    /// Empty or otherwise unusable attribute input to keygen/encapsulation.
    InvalidAttribute,
    /// The key material does not satisfy the policy at decapsulation time.
    AttributeMismatch,
    /// Byte data does not decode to a valid group element under the given
    /// pairing descriptor.
    MalformedElement,
    /// Hybrid decryption failed. Deliberately covers both a failed AEAD tag
    /// and a wrong session key derived from an unsatisfied policy.
    Decryption,
}

/// The crate-wide error type: a kind plus a human readable detail string.
#[derive(Clone, PartialEq, Debug)]
pub struct AbeError {
    kind: ErrorKind,
    details: String,
}

impl AbeError {
    pub fn new(kind: ErrorKind, msg: &str) -> AbeError {
        AbeError {
            kind,
            details: msg.to_string(),
        }
    }

    pub fn policy_syntax(msg: &str) -> AbeError {
        AbeError::new(ErrorKind::PolicySyntax, msg)
    }

    pub fn invalid_attribute(msg: &str) -> AbeError {
        AbeError::new(ErrorKind::InvalidAttribute, msg)
    }

    pub fn attribute_mismatch(msg: &str) -> AbeError {
        AbeError::new(ErrorKind::AttributeMismatch, msg)
    }

    pub fn malformed_element(msg: &str) -> AbeError {
        AbeError::new(ErrorKind::MalformedElement, msg)
    }

    pub fn decryption(msg: &str) -> AbeError {
        AbeError::new(ErrorKind::Decryption, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for AbeError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?} error: {}", self.kind, self.details)
    }
}

impl std::error::Error for AbeError {}

impl From<PestError<Rule>> for AbeError {
    fn from(error: PestError<Rule>) -> Self {
        let (line, col) = match error.line_col {
            LineColLocation::Pos((line, col)) => (line, col),
            LineColLocation::Span((start_line, col), (end_line, _)) => {
                (cmp::max(start_line, end_line), col)
            }
        };
        AbeError::policy_syntax(&format!("policy error at line {} col {}", line, col))
    }
}

impl From<FieldError> for AbeError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::InvalidSliceLength => {
                AbeError::malformed_element("FieldError::InvalidSliceLength")
            }
            FieldError::InvalidU512Encoding => {
                AbeError::malformed_element("FieldError::InvalidU512Encoding")
            }
            FieldError::NotMember => AbeError::malformed_element("FieldError::NotMember"),
        }
    }
}

impl From<bincode::Error> for AbeError {
    fn from(error: bincode::Error) -> Self {
        AbeError::malformed_element(&error.to_string())
    }
}

impl From<aes_gcm::Error> for AbeError {
    // the aead error is intentionally opaque, there is no more information in here
    fn from(_error: aes_gcm::Error) -> Self {
        AbeError::decryption("symmetric cipher failed to authenticate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_preserved() {
        let e = AbeError::attribute_mismatch("key does not satisfy policy");
        assert_eq!(e.kind(), ErrorKind::AttributeMismatch);
        assert!(e.to_string().contains("key does not satisfy policy"));
    }
}
