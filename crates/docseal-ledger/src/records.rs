use docseal_crypto::vault::{KEY_SIZE, NONCE_SIZE};
use docseal_crypto::{DecryptedDocument, SealedBytes, Vault, VaultError, VaultKey, VaultNonce};
use docseal_types::{DocumentProof, ProofId, TransactionRef};
use serde::{Deserialize, Serialize};

/// At-rest form of a document's bytes.
///
/// The key travels with the ciphertext, so anyone who can read the payload
/// store can decrypt it. Encryption here protects storage-layer integrity
/// (any alteration fails authentication); provenance is protected separately
/// by the fingerprint and its ledger anchor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: VaultNonce,
    pub key: VaultKey,
    pub mime_type: String,
}

impl EncryptedPayload {
    pub fn from_sealed(sealed: SealedBytes, mime_type: impl Into<String>) -> Self {
        Self {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            key: sealed.key,
            mime_type: mime_type.into(),
        }
    }

    /// Decrypt back to the original bytes and mime type.
    pub fn open(&self) -> Result<DecryptedDocument, VaultError> {
        Vault::decrypt(&self.ciphertext, &self.key, &self.nonce, &self.mime_type)
    }

    /// Bytes this payload occupies in a store.
    pub fn size(&self) -> u64 {
        (self.ciphertext.len() + NONCE_SIZE + KEY_SIZE + self.mime_type.len()) as u64
    }
}

/// Capacity ceiling of a payload store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLimits {
    /// Largest single payload accepted, in bytes.
    pub max_payload_bytes: Option<u64>,
    /// Largest total size of all payloads, in bytes.
    pub max_total_bytes: Option<u64>,
}

impl StoreLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Reject a payload of `size` bytes when the store already holds
    /// `current_total` bytes (excluding any payload it would replace).
    pub(crate) fn check(&self, size: u64, current_total: u64) -> Result<(), (u64, u64)> {
        if let Some(limit) = self.max_payload_bytes {
            if size > limit {
                return Err((size, limit));
            }
        }
        if let Some(limit) = self.max_total_bytes {
            if current_total.saturating_add(size) > limit {
                return Err((size, limit));
            }
        }
        Ok(())
    }
}

/// A single proof ledger mutation, as recorded in the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofEvent {
    /// A proof record was created (or carried over by compaction).
    Created(DocumentProof),
    /// A ledger reference was attached to an existing proof.
    Anchored {
        id: ProofId,
        transaction_id: TransactionRef,
    },
}
