use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docseal_crypto::SigningKey;
use docseal_types::AccountAddress;
use tracing::debug;

use crate::error::SignError;
use crate::traits::SigningService;
use crate::transaction::{SignedTransaction, Transaction};

/// Signing service backed by a local Ed25519 key.
///
/// Signs everything it is asked to unless switched to declining, in which
/// case every request fails with [`SignError::Cancelled`].
pub struct LocalSigner {
    key: SigningKey,
    declining: AtomicBool,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            declining: AtomicBool::new(false),
        }
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::generate())
    }

    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }

    /// Sign without going through the service interface.
    pub fn sign_now(&self, transaction: &Transaction) -> Result<SignedTransaction, SignError> {
        if self.declining.load(Ordering::SeqCst) {
            return Err(SignError::Cancelled);
        }
        if transaction.sender != self.address() {
            return Err(SignError::Failed(format!(
                "signer holds {} but transaction is from {}",
                self.address(),
                transaction.sender
            )));
        }
        debug!(sender = %transaction.sender, "signing transaction");
        Ok(SignedTransaction::sign(transaction.clone(), &self.key))
    }
}

#[async_trait]
impl SigningService for LocalSigner {
    fn address(&self) -> AccountAddress {
        self.key.address()
    }

    async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, SignError> {
        self.sign_now(transaction)
    }
}
