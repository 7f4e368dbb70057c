use docseal_types::{ProofId, TransactionRef};

/// Errors produced by proof ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("proof not found: {0}")]
    NotFound(ProofId),

    #[error("proof {id} is already anchored under {existing}")]
    AlreadyAnchored { id: ProofId, existing: TransactionRef },

    #[error("proof id {0} already exists")]
    DuplicateId(ProofId),

    #[error("journal error: {0}")]
    Journal(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl From<docseal_journal::JournalError> for LedgerError {
    fn from(e: docseal_journal::JournalError) -> Self {
        Self::Journal(e.to_string())
    }
}

/// Result alias for proof ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors from payload store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The payload does not fit under the configured capacity ceiling.
    #[error("payload of {size} bytes exceeds storage capacity ({limit} bytes)")]
    CapacityExceeded { size: u64, limit: u64 },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored payload could not be decoded.
    #[error("corrupt payload {id}: {reason}")]
    Corrupt { id: ProofId, reason: String },

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for payload store operations.
pub type StoreResult<T> = Result<T, StoreError>;
