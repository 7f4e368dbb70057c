use async_trait::async_trait;
use docseal_types::{AccountAddress, Round, TransactionRef};
use serde::{Deserialize, Serialize};

use crate::error::{NetworkResult, SignError};
use crate::transaction::{SignedTransaction, Transaction};

/// External authority that signs transactions on behalf of an account.
///
/// A human may sit behind it; declining is reported as
/// [`SignError::Cancelled`].
#[async_trait]
pub trait SigningService: Send + Sync {
    /// Account whose key this service holds.
    fn address(&self) -> AccountAddress;

    async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, SignError>;
}

/// A finalized transaction as reported by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub tx_ref: TransactionRef,
    pub sender: AccountAddress,
    /// Attached data, byte-exact as submitted.
    pub note: Vec<u8>,
    pub confirmed_round: Round,
}

/// Proof that a submitted transaction reached a finalized block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_ref: TransactionRef,
    pub confirmed_round: Round,
}

/// External append-only ledger network.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Identifier of the chain; transactions for another chain are rejected.
    fn genesis_id(&self) -> &str;

    /// Latest round, used to fill a transaction's validity window.
    async fn current_round(&self) -> NetworkResult<Round>;

    /// Submit a signed transaction. Returns its pending reference.
    async fn submit(&self, transaction: &SignedTransaction) -> NetworkResult<TransactionRef>;

    /// Wait until `pending` is finalized, for at most `max_rounds` rounds.
    async fn await_confirmation(
        &self,
        pending: &TransactionRef,
        max_rounds: Round,
    ) -> NetworkResult<Confirmation>;

    /// Look up a finalized transaction. Pending transactions are not found.
    async fn lookup(&self, tx_ref: &TransactionRef) -> NetworkResult<LedgerEntry>;
}
