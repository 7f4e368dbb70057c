use docseal_types::{ProofId, TransactionRef};
use thiserror::Error;

/// Reasons a verification could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The proof has no ledger reference yet.
    #[error("proof {0} has not been anchored")]
    NotAnchored(ProofId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The ledger has no record of the reference: an integrity gap.
    #[error("ledger has no transaction {0}")]
    TransactionNotFound(TransactionRef),

    /// The ledger could not be reached. Says nothing about tampering.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The transaction exists but does not carry a fingerprint.
    #[error("transaction {tx} does not carry a fingerprint: {reason}")]
    MalformedAnchor { tx: TransactionRef, reason: String },
}
