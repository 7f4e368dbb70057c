use std::collections::HashMap;
use std::sync::RwLock;

use docseal_types::{AnchorAttach, DocumentProof, FileMetadata, Fingerprint, ProofId, TransactionRef};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult, StoreError, StoreResult};
use crate::records::{EncryptedPayload, StoreLimits};
use crate::traits::{PayloadStore, ProofLedger};

/// Insertion-ordered proof records with an id index.
#[derive(Default)]
pub(crate) struct ProofTable {
    records: Vec<DocumentProof>,
    index: HashMap<ProofId, usize>,
}

impl ProofTable {
    pub(crate) fn get(&self, id: &ProofId) -> Option<&DocumentProof> {
        self.index.get(id).and_then(|&i| self.records.get(i))
    }

    pub(crate) fn insert(&mut self, proof: DocumentProof) -> LedgerResult<()> {
        if self.index.contains_key(&proof.id()) {
            return Err(LedgerError::DuplicateId(proof.id()));
        }
        self.index.insert(proof.id(), self.records.len());
        self.records.push(proof);
        Ok(())
    }

    /// Compute the anchored form of a record without committing it.
    ///
    /// Returns `Ok(None)` when the record already carries `tx`.
    pub(crate) fn prepare_anchor(
        &self,
        id: &ProofId,
        tx: &TransactionRef,
    ) -> LedgerResult<Option<DocumentProof>> {
        let mut updated = self.get(id).cloned().ok_or(LedgerError::NotFound(*id))?;
        match updated.attach_transaction(tx.clone()) {
            AnchorAttach::Attached => Ok(Some(updated)),
            AnchorAttach::Unchanged => Ok(None),
            AnchorAttach::Conflict { existing } => {
                Err(LedgerError::AlreadyAnchored { id: *id, existing })
            }
        }
    }

    pub(crate) fn replace(&mut self, proof: DocumentProof) -> LedgerResult<()> {
        let &i = self
            .index
            .get(&proof.id())
            .ok_or(LedgerError::NotFound(proof.id()))?;
        self.records[i] = proof;
        Ok(())
    }

    pub(crate) fn records(&self) -> &[DocumentProof] {
        &self.records
    }
}

/// In-memory proof ledger for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryProofLedger {
    inner: RwLock<ProofTable>,
}

impl InMemoryProofLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProofLedger for InMemoryProofLedger {
    fn create(&self, metadata: &FileMetadata, full_hash: Fingerprint) -> LedgerResult<DocumentProof> {
        let mut table = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        let proof = DocumentProof::new(metadata, full_hash);
        table.insert(proof.clone())?;
        info!(proof = %proof.id(), hash = %proof.short_hash(), "proof created");
        Ok(proof)
    }

    fn get(&self, id: &ProofId) -> LedgerResult<Option<DocumentProof>> {
        let table = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.get(id).cloned())
    }

    fn list(&self) -> LedgerResult<Vec<DocumentProof>> {
        let table = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.records().to_vec())
    }

    fn set_transaction_id(&self, id: &ProofId, tx: &TransactionRef) -> LedgerResult<DocumentProof> {
        let mut table = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        match table.prepare_anchor(id, tx)? {
            Some(updated) => {
                table.replace(updated.clone())?;
                info!(proof = %id, tx = %tx.short(), "proof anchored");
                Ok(updated)
            }
            None => {
                debug!(proof = %id, "transaction id already recorded");
                table.get(id).cloned().ok_or(LedgerError::NotFound(*id))
            }
        }
    }

    fn len(&self) -> LedgerResult<usize> {
        let table = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.records().len())
    }
}

/// In-memory payload store with an optional capacity ceiling.
#[derive(Default)]
pub struct InMemoryPayloadStore {
    limits: StoreLimits,
    payloads: RwLock<HashMap<ProofId, EncryptedPayload>>,
}

impl InMemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            payloads: RwLock::new(HashMap::new()),
        }
    }

    /// Total bytes currently held.
    pub fn total_size(&self) -> StoreResult<u64> {
        let payloads = self.payloads.read().map_err(|_| StoreError::Poisoned)?;
        Ok(payloads.values().map(EncryptedPayload::size).sum())
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn put(&self, id: &ProofId, payload: &EncryptedPayload) -> StoreResult<()> {
        let mut payloads = self.payloads.write().map_err(|_| StoreError::Poisoned)?;
        let current: u64 = payloads
            .iter()
            .filter(|(k, _)| *k != id)
            .map(|(_, p)| p.size())
            .sum();
        self.limits
            .check(payload.size(), current)
            .map_err(|(size, limit)| StoreError::CapacityExceeded { size, limit })?;
        payloads.insert(*id, payload.clone());
        debug!(proof = %id, size = payload.size(), "payload stored");
        Ok(())
    }

    fn get(&self, id: &ProofId) -> StoreResult<Option<EncryptedPayload>> {
        let payloads = self.payloads.read().map_err(|_| StoreError::Poisoned)?;
        Ok(payloads.get(id).cloned())
    }

    fn remove(&self, id: &ProofId) -> StoreResult<bool> {
        let mut payloads = self.payloads.write().map_err(|_| StoreError::Poisoned)?;
        Ok(payloads.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_crypto::{DocumentHasher, Vault};

    fn metadata(name: &str) -> FileMetadata {
        FileMetadata {
            name: name.into(),
            size: 12,
            mime_type: "text/plain".into(),
        }
    }

    fn tx(seed: u8) -> TransactionRef {
        TransactionRef::from_digest(&[seed; 32])
    }

    #[test]
    fn create_assigns_unique_ids_and_keeps_order() {
        let ledger = InMemoryProofLedger::new();
        let a = ledger
            .create(&metadata("a.txt"), DocumentHasher::hash(b"a").unwrap())
            .unwrap();
        let b = ledger
            .create(&metadata("b.txt"), DocumentHasher::hash(b"b").unwrap())
            .unwrap();

        assert_ne!(a.id(), b.id());
        let ids: Vec<_> = ledger.list().unwrap().iter().map(DocumentProof::id).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let ledger = InMemoryProofLedger::new();
        assert!(ledger.get(&ProofId::new()).unwrap().is_none());
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn set_transaction_id_is_idempotent_for_same_value() {
        let ledger = InMemoryProofLedger::new();
        let proof = ledger
            .create(&metadata("a.txt"), DocumentHasher::hash(b"a").unwrap())
            .unwrap();

        let first = ledger.set_transaction_id(&proof.id(), &tx(1)).unwrap();
        let second = ledger.set_transaction_id(&proof.id(), &tx(1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.transaction_id(), Some(&tx(1)));
        assert_eq!(first.full_hash(), proof.full_hash());
    }

    #[test]
    fn set_transaction_id_rejects_different_value() {
        let ledger = InMemoryProofLedger::new();
        let proof = ledger
            .create(&metadata("a.txt"), DocumentHasher::hash(b"a").unwrap())
            .unwrap();
        ledger.set_transaction_id(&proof.id(), &tx(1)).unwrap();

        let err = ledger.set_transaction_id(&proof.id(), &tx(2)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::AlreadyAnchored {
                id: proof.id(),
                existing: tx(1)
            }
        );
        let stored = ledger.get(&proof.id()).unwrap().unwrap();
        assert_eq!(stored.transaction_id(), Some(&tx(1)));
    }

    #[test]
    fn set_transaction_id_never_creates_records() {
        let ledger = InMemoryProofLedger::new();
        let missing = ProofId::new();
        assert_eq!(
            ledger.set_transaction_id(&missing, &tx(1)).unwrap_err(),
            LedgerError::NotFound(missing)
        );
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn concurrent_anchoring_of_one_record_settles_on_one_reference() {
        let ledger = std::sync::Arc::new(InMemoryProofLedger::new());
        let proof = ledger
            .create(&metadata("a.txt"), DocumentHasher::hash(b"a").unwrap())
            .unwrap();

        let handles: Vec<_> = (0..8u8)
            .map(|seed| {
                let ledger = ledger.clone();
                let id = proof.id();
                std::thread::spawn(move || ledger.set_transaction_id(&id, &tx(seed)).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert!(ledger.get(&proof.id()).unwrap().unwrap().is_anchored());
    }

    #[test]
    fn payload_store_roundtrip_and_remove() {
        let store = InMemoryPayloadStore::new();
        let id = ProofId::new();
        let payload = EncryptedPayload::from_sealed(Vault::encrypt(b"doc").unwrap(), "text/plain");

        store.put(&id, &payload).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(payload));
        assert!(store.contains(&id).unwrap());
        assert!(store.remove(&id).unwrap());
        assert!(!store.remove(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn payload_store_enforces_capacity() {
        let store = InMemoryPayloadStore::with_limits(StoreLimits {
            max_payload_bytes: Some(64),
            max_total_bytes: None,
        });
        let big = EncryptedPayload::from_sealed(Vault::encrypt(&[0u8; 128]).unwrap(), "text/plain");
        let err = store.put(&ProofId::new(), &big).unwrap_err();
        assert!(matches!(err, StoreError::CapacityExceeded { limit: 64, .. }));
        assert_eq!(store.total_size().unwrap(), 0);
    }

    #[test]
    fn replacing_a_payload_does_not_count_it_twice() {
        let payload = EncryptedPayload::from_sealed(Vault::encrypt(&[1u8; 10]).unwrap(), "text/plain");
        let store = InMemoryPayloadStore::with_limits(StoreLimits {
            max_payload_bytes: None,
            max_total_bytes: Some(payload.size()),
        });
        let id = ProofId::new();
        store.put(&id, &payload).unwrap();
        store.put(&id, &payload).unwrap();
        assert!(store.put(&ProofId::new(), &payload).is_err());
    }

    #[test]
    fn losing_a_payload_leaves_the_proof_intact() {
        let ledger = InMemoryProofLedger::new();
        let store = InMemoryPayloadStore::new();
        let proof = ledger
            .create(&metadata("a.txt"), DocumentHasher::hash(b"a").unwrap())
            .unwrap();
        let anchored = ledger.set_transaction_id(&proof.id(), &tx(3)).unwrap();
        store
            .put(
                &proof.id(),
                &EncryptedPayload::from_sealed(Vault::encrypt(b"a").unwrap(), "text/plain"),
            )
            .unwrap();

        store.remove(&proof.id()).unwrap();

        assert_eq!(ledger.get(&proof.id()).unwrap(), Some(anchored));
    }
}
