use docseal_types::{DocumentProof, FileMetadata, Fingerprint, ProofId, TransactionRef};

use crate::error::{LedgerResult, StoreResult};
use crate::records::EncryptedPayload;

/// Append/update store of proof records.
///
/// Implementations must satisfy these invariants:
/// - `create` never reuses an id.
/// - A record's fingerprint and metadata never change after `create`.
/// - `set_transaction_id` is the only mutation; it is atomic per record and
///   never creates a record.
/// - `list` returns a consistent snapshot in insertion order.
pub trait ProofLedger: Send + Sync {
    /// Create and persist a new unanchored proof.
    fn create(&self, metadata: &FileMetadata, full_hash: Fingerprint) -> LedgerResult<DocumentProof>;

    /// Look up a proof. `Ok(None)` is a normal outcome.
    fn get(&self, id: &ProofId) -> LedgerResult<Option<DocumentProof>>;

    /// All proofs in insertion order.
    fn list(&self) -> LedgerResult<Vec<DocumentProof>>;

    /// Attach a ledger reference to an existing proof.
    ///
    /// Calling again with the same reference returns the record unchanged.
    /// A different reference on an anchored record fails with
    /// [`LedgerError::AlreadyAnchored`](crate::LedgerError::AlreadyAnchored);
    /// an unknown id fails with [`LedgerError::NotFound`](crate::LedgerError::NotFound).
    fn set_transaction_id(&self, id: &ProofId, tx: &TransactionRef) -> LedgerResult<DocumentProof>;

    /// Number of proofs held.
    fn len(&self) -> LedgerResult<usize>;

    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Keyed store of encrypted document payloads.
///
/// The store has a capacity ceiling and may refuse a payload with
/// [`StoreError::CapacityExceeded`](crate::StoreError::CapacityExceeded);
/// callers treat that, and `Ok(None)` on read, as recoverable.
pub trait PayloadStore: Send + Sync {
    /// Store (or replace) the payload for a proof id.
    fn put(&self, id: &ProofId, payload: &EncryptedPayload) -> StoreResult<()>;

    /// Read the payload for a proof id.
    fn get(&self, id: &ProofId) -> StoreResult<Option<EncryptedPayload>>;

    /// Drop the payload for a proof id. Returns `true` if one existed.
    fn remove(&self, id: &ProofId) -> StoreResult<bool>;

    fn contains(&self, id: &ProofId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }
}
