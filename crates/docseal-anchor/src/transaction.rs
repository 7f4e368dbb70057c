use docseal_crypto::{Signature, SignatureError, SigningKey, VerifyingKey};
use docseal_types::{AccountAddress, Fingerprint, Round, TransactionRef};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

const TX_DOMAIN: &[u8] = b"docseal-tx-v1";

/// A ledger transaction before signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: AccountAddress,
    pub receiver: AccountAddress,
    pub amount: u64,
    /// Opaque attached data.
    pub note: Vec<u8>,
    pub first_valid: Round,
    pub last_valid: Round,
    pub genesis_id: String,
}

impl Transaction {
    /// Zero-amount, self-addressed transaction whose note is the lowercase
    /// hex rendering of `fingerprint`.
    pub fn anchor(
        account: AccountAddress,
        fingerprint: &Fingerprint,
        first_valid: Round,
        validity_rounds: Round,
        genesis_id: impl Into<String>,
    ) -> Self {
        Self {
            sender: account,
            receiver: account,
            amount: 0,
            note: fingerprint.to_hex().into_bytes(),
            first_valid,
            last_valid: first_valid.saturating_add(validity_rounds),
            genesis_id: genesis_id.into(),
        }
    }

    /// Deterministic encoding covered by the signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            TX_DOMAIN.len() + 32 * 2 + 8 * 3 + 16 + self.genesis_id.len() + self.note.len(),
        );
        out.extend_from_slice(TX_DOMAIN);
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(self.receiver.as_bytes());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.first_valid.to_le_bytes());
        out.extend_from_slice(&self.last_valid.to_le_bytes());
        put_len_prefixed(&mut out, self.genesis_id.as_bytes());
        put_len_prefixed(&mut out, &self.note);
        out
    }

    pub fn is_valid_at(&self, round: Round) -> bool {
        (self.first_valid..=self.last_valid).contains(&round)
    }
}

fn put_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// A transaction together with its signer and Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signer: AccountAddress,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn sign(transaction: Transaction, key: &SigningKey) -> Self {
        let signature = key.sign(&transaction.canonical_bytes());
        Self {
            transaction,
            signer: key.address(),
            signature,
        }
    }

    /// Check the signature against the signer's public key.
    pub fn verify(&self) -> Result<(), SignatureError> {
        VerifyingKey::from_address(&self.signer)?
            .verify(&self.transaction.canonical_bytes(), &self.signature)
    }

    /// Ledger reference: SHA-512/256 over the signed encoding.
    pub fn tx_ref(&self) -> TransactionRef {
        let mut hasher = Sha512_256::new();
        hasher.update(self.transaction.canonical_bytes());
        hasher.update(self.signer.as_bytes());
        hasher.update(self.signature.to_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        TransactionRef::from_digest(&digest)
    }
}
