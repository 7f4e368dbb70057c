use thiserror::Error;

/// Errors produced by type parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid proof id: {0}")]
    InvalidProofId(String),

    #[error("invalid transaction reference: {0}")]
    InvalidTransactionRef(String),
}
