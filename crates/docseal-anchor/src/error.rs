use docseal_types::{Round, TransactionRef};
use thiserror::Error;

use crate::state::{AnchorFailure, AnchorState};

/// Outcome of a signing request other than a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The human (or policy) behind the signer declined.
    #[error("signing cancelled by user")]
    Cancelled,

    #[error("signing failed: {0}")]
    Failed(String),
}

/// Errors reported by a ledger network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The network refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The network could not be reached.
    #[error("ledger network unavailable: {0}")]
    Unavailable(String),

    /// No finalized transaction carries this reference.
    #[error("transaction not found: {0}")]
    NotFound(TransactionRef),

    /// The transaction was not finalized within the round budget.
    #[error("transaction {pending} not confirmed after {rounds} rounds")]
    Timeout { pending: TransactionRef, rounds: Round },
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// A failed anchoring attempt: the stage it reached and why it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("anchoring failed during {stage}: {failure}")]
pub struct AnchorError {
    pub stage: AnchorState,
    pub failure: AnchorFailure,
}
