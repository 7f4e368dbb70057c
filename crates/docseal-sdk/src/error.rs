use docseal_anchor::AnchorError;
use docseal_crypto::{HashError, VaultError};
use docseal_journal::JournalError;
use docseal_ledger::{LedgerError, StoreError};
use docseal_types::{ProofId, TransactionRef};
use docseal_verify::VerifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Bad or empty input document.
    #[error("invalid input: {0}")]
    Input(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] VaultError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error("verification could not be performed: {0}")]
    Verify(#[from] VerifyError),

    #[error("proof not found: {0}")]
    ProofNotFound(ProofId),

    #[error("document for proof {0} is not stored locally")]
    PayloadNotFound(ProofId),

    #[error("proof {id} is already anchored under {transaction_id}")]
    AlreadyAnchored {
        id: ProofId,
        transaction_id: TransactionRef,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<HashError> for SdkError {
    fn from(e: HashError) -> Self {
        Self::Input(e.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
