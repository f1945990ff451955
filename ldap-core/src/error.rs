use std::string::FromUtf8Error;
use thiserror::Error;

/// Main error type for BER and control operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LdapError {
    #[error("Truncated input: {0}")]
    TruncatedInput(String),

    #[error("Unknown universal tag: {0}")]
    UnknownUniversalTag(u32),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing field: index {index} out of bounds for {len} elements")]
    MissingField { index: usize, len: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid OID: {0}")]
    InvalidOid(String),

    #[error("Nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("Invalid UTF-8 in octet string")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Result type alias for BER and control operations
pub type LdapResult<T> = Result<T, LdapError>;
