use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use docseal_journal::{Journal, JournalConfig, JournalError};
use docseal_types::{Round, TransactionRef};
use tracing::{debug, info, warn};

use crate::error::{NetworkError, NetworkResult};
use crate::traits::{Confirmation, LedgerEntry, LedgerNetwork};
use crate::transaction::SignedTransaction;

/// Settings of a [`DevnetLedger`].
#[derive(Clone, Debug)]
pub struct DevnetConfig {
    pub genesis_id: String,
    /// Rounds between submission and finality.
    pub finality_delay_rounds: Round,
    /// Wall-clock length of one round while awaiting confirmation.
    pub round_interval: Duration,
    pub max_note_bytes: usize,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            genesis_id: "docseal-devnet-v1".into(),
            finality_delay_rounds: 1,
            round_interval: Duration::from_millis(50),
            max_note_bytes: 1024,
        }
    }
}

struct Pending {
    transaction: SignedTransaction,
    submitted_round: Round,
}

#[derive(Default)]
struct Chain {
    round: Round,
    pending: HashMap<TransactionRef, Pending>,
    finalized: HashMap<TransactionRef, LedgerEntry>,
    offline: bool,
}

/// In-process ledger network.
///
/// Rounds advance while a caller awaits confirmation (or through
/// [`advance_round`](Self::advance_round)); a submitted transaction is
/// finalized `finality_delay_rounds` rounds after it was accepted. When
/// opened with a journal, finalized entries survive restarts.
pub struct DevnetLedger {
    config: DevnetConfig,
    chain: Mutex<Chain>,
    journal: Option<Journal<LedgerEntry>>,
}

impl DevnetLedger {
    /// Ledger with no persistence.
    pub fn new(config: DevnetConfig) -> Self {
        Self {
            config,
            chain: Mutex::new(Chain::default()),
            journal: None,
        }
    }

    /// Ledger whose finalized entries are journaled at `path`.
    pub fn open(path: &Path, config: DevnetConfig, journal: JournalConfig) -> Result<Self, JournalError> {
        let journal: Journal<LedgerEntry> = Journal::open(path, journal)?;
        let mut chain = Chain::default();
        for entry in journal.recover()? {
            chain.round = chain.round.max(entry.confirmed_round);
            chain.finalized.insert(entry.tx_ref.clone(), entry);
        }
        info!(path = %path.display(), entries = chain.finalized.len(), round = chain.round, "devnet ledger loaded");
        Ok(Self {
            config,
            chain: Mutex::new(chain),
            journal: Some(journal),
        })
    }

    /// Simulate losing (or regaining) network connectivity.
    pub fn set_offline(&self, offline: bool) -> NetworkResult<()> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Close the current round, finalizing every transaction that is due.
    pub fn advance_round(&self) -> NetworkResult<Round> {
        let mut chain = self.lock()?;
        chain.round += 1;
        let round = chain.round;

        let due: Vec<TransactionRef> = chain
            .pending
            .iter()
            .filter(|(_, p)| p.submitted_round + self.config.finality_delay_rounds <= round)
            .map(|(r, _)| r.clone())
            .collect();

        for tx_ref in due {
            let Some(pending) = chain.pending.get(&tx_ref) else {
                continue;
            };
            let entry = LedgerEntry {
                tx_ref: tx_ref.clone(),
                sender: pending.transaction.transaction.sender,
                note: pending.transaction.transaction.note.clone(),
                confirmed_round: round,
            };
            // Stays pending until the entry is durable.
            if let Some(journal) = &self.journal {
                if let Err(e) = journal.append(&entry) {
                    warn!(tx = %tx_ref.short(), error = %e, "cannot journal finalized transaction");
                    return Err(NetworkError::Unavailable(e.to_string()));
                }
            }
            chain.pending.remove(&tx_ref);
            debug!(tx = %tx_ref.short(), round, "transaction finalized");
            chain.finalized.insert(tx_ref, entry);
        }
        Ok(round)
    }

    fn lock(&self) -> NetworkResult<MutexGuard<'_, Chain>> {
        self.chain
            .lock()
            .map_err(|_| NetworkError::Unavailable("ledger state poisoned".into()))
    }

    fn online(&self) -> NetworkResult<MutexGuard<'_, Chain>> {
        let chain = self.lock()?;
        if chain.offline {
            return Err(NetworkError::Unavailable("devnet is offline".into()));
        }
        Ok(chain)
    }

    fn check(&self, signed: &SignedTransaction, round: Round) -> Result<(), String> {
        let tx = &signed.transaction;
        if tx.genesis_id != self.config.genesis_id {
            return Err(format!("wrong network: {}", tx.genesis_id));
        }
        if !tx.is_valid_at(round) {
            return Err(format!(
                "round {round} outside validity window {}..={}",
                tx.first_valid, tx.last_valid
            ));
        }
        if tx.note.len() > self.config.max_note_bytes {
            return Err(format!(
                "note of {} bytes exceeds {} byte limit",
                tx.note.len(),
                self.config.max_note_bytes
            ));
        }
        if signed.signer != tx.sender {
            return Err("signer is not the sender".into());
        }
        signed.verify().map_err(|e| e.to_string())
    }
}

#[async_trait]
impl LedgerNetwork for DevnetLedger {
    fn genesis_id(&self) -> &str {
        &self.config.genesis_id
    }

    async fn current_round(&self) -> NetworkResult<Round> {
        Ok(self.online()?.round)
    }

    async fn submit(&self, transaction: &SignedTransaction) -> NetworkResult<TransactionRef> {
        let mut chain = self.online()?;
        let round = chain.round;
        if let Err(reason) = self.check(transaction, round) {
            warn!(%reason, "devnet rejected transaction");
            return Err(NetworkError::Rejected(reason));
        }

        let tx_ref = transaction.tx_ref();
        if chain.pending.contains_key(&tx_ref) || chain.finalized.contains_key(&tx_ref) {
            return Err(NetworkError::Rejected(format!("transaction {tx_ref} already submitted")));
        }
        chain.pending.insert(
            tx_ref.clone(),
            Pending {
                transaction: transaction.clone(),
                submitted_round: round,
            },
        );
        debug!(tx = %tx_ref.short(), round, "transaction accepted");
        Ok(tx_ref)
    }

    async fn await_confirmation(
        &self,
        pending: &TransactionRef,
        max_rounds: Round,
    ) -> NetworkResult<Confirmation> {
        let mut waited = 0;
        loop {
            {
                let chain = self.online()?;
                if let Some(entry) = chain.finalized.get(pending) {
                    return Ok(Confirmation {
                        tx_ref: entry.tx_ref.clone(),
                        confirmed_round: entry.confirmed_round,
                    });
                }
                if !chain.pending.contains_key(pending) {
                    return Err(NetworkError::NotFound(pending.clone()));
                }
            }
            if waited == max_rounds {
                break;
            }
            tokio::time::sleep(self.config.round_interval).await;
            self.advance_round()?;
            waited += 1;
        }
        Err(NetworkError::Timeout {
            pending: pending.clone(),
            rounds: max_rounds,
        })
    }

    async fn lookup(&self, tx_ref: &TransactionRef) -> NetworkResult<LedgerEntry> {
        self.online()?
            .finalized
            .get(tx_ref)
            .cloned()
            .ok_or_else(|| NetworkError::NotFound(tx_ref.clone()))
    }
}
