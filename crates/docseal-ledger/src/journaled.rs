use std::path::Path;
use std::sync::RwLock;

use docseal_journal::{Journal, JournalConfig};
use docseal_types::{DocumentProof, FileMetadata, Fingerprint, ProofId, TransactionRef};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::memory::ProofTable;
use crate::records::ProofEvent;
use crate::traits::ProofLedger;

/// Proof ledger persisted as a journal of [`ProofEvent`]s.
///
/// On open the journal is replayed into an in-memory table. Every mutation
/// is appended to the journal before it is applied, with the table's write
/// lock held for the whole read-modify-write.
pub struct JournaledProofLedger {
    journal: Journal<ProofEvent>,
    table: RwLock<ProofTable>,
}

impl JournaledProofLedger {
    /// Open (or create) the ledger journal at `path` and replay it.
    pub fn open(path: &Path, config: JournalConfig) -> LedgerResult<Self> {
        let journal = Journal::open(path, config)?;
        let events = journal.recover()?;
        let total = events.len();
        let table = replay(events);
        info!(path = %path.display(), events = total, proofs = table.records().len(), "proof ledger loaded");
        Ok(Self {
            journal,
            table: RwLock::new(table),
        })
    }

    /// Rewrite the journal as one `Created` event per current record.
    pub fn compact(&self) -> LedgerResult<()> {
        let table = self.table.write().map_err(|_| LedgerError::Poisoned)?;
        let events: Vec<ProofEvent> = table
            .records()
            .iter()
            .cloned()
            .map(ProofEvent::Created)
            .collect();
        self.journal.rewrite(&events)?;
        debug!(proofs = events.len(), "proof journal compacted");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.journal.path()
    }
}

fn replay(events: Vec<ProofEvent>) -> ProofTable {
    let mut table = ProofTable::default();
    for event in events {
        match event {
            ProofEvent::Created(proof) => {
                if let Err(e) = table.insert(proof) {
                    warn!(error = %e, "skipping journal entry");
                }
            }
            ProofEvent::Anchored { id, transaction_id } => {
                let applied = table
                    .prepare_anchor(&id, &transaction_id)
                    .and_then(|updated| match updated {
                        Some(proof) => table.replace(proof),
                        None => Ok(()),
                    });
                if let Err(e) = applied {
                    warn!(error = %e, "skipping journal entry");
                }
            }
        }
    }
    table
}

impl ProofLedger for JournaledProofLedger {
    fn create(&self, metadata: &FileMetadata, full_hash: Fingerprint) -> LedgerResult<DocumentProof> {
        let mut table = self.table.write().map_err(|_| LedgerError::Poisoned)?;
        let proof = DocumentProof::new(metadata, full_hash);
        if table.get(&proof.id()).is_some() {
            return Err(LedgerError::DuplicateId(proof.id()));
        }
        self.journal.append(&ProofEvent::Created(proof.clone()))?;
        table.insert(proof.clone())?;
        info!(proof = %proof.id(), hash = %proof.short_hash(), "proof created");
        Ok(proof)
    }

    fn get(&self, id: &ProofId) -> LedgerResult<Option<DocumentProof>> {
        let table = self.table.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.get(id).cloned())
    }

    fn list(&self) -> LedgerResult<Vec<DocumentProof>> {
        let table = self.table.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.records().to_vec())
    }

    fn set_transaction_id(&self, id: &ProofId, tx: &TransactionRef) -> LedgerResult<DocumentProof> {
        let mut table = self.table.write().map_err(|_| LedgerError::Poisoned)?;
        match table.prepare_anchor(id, tx)? {
            Some(updated) => {
                self.journal.append(&ProofEvent::Anchored {
                    id: *id,
                    transaction_id: tx.clone(),
                })?;
                table.replace(updated.clone())?;
                info!(proof = %id, tx = %tx.short(), "proof anchored");
                Ok(updated)
            }
            None => table.get(id).cloned().ok_or(LedgerError::NotFound(*id)),
        }
    }

    fn len(&self) -> LedgerResult<usize> {
        let table = self.table.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(table.records().len())
    }
}
