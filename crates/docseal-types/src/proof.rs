use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::FileMetadata;
use crate::error::TypeError;
use crate::fingerprint::Fingerprint;
use crate::network::TransactionRef;

/// Unique identifier of a proof record (UUID v7 for time-ordering).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofId(uuid::Uuid);

impl ProofId {
    /// Generate a new time-ordered proof ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ProofId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofId({})", self.short_id())
    }
}

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProofId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidProofId(e.to_string()))
    }
}

/// Result of attaching a transaction reference to a proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnchorAttach {
    /// The reference was recorded.
    Attached,
    /// The proof already carried this exact reference.
    Unchanged,
    /// The proof is already anchored under a different reference.
    Conflict { existing: TransactionRef },
}

/// Local proof record binding a document to its content fingerprint.
///
/// Everything except `transaction_id` is fixed at creation. The transaction
/// reference starts empty, may be set once, and is never cleared or
/// replaced. The fingerprint is never recomputed: anchoring only attaches a
/// reference to the existing hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProof {
    id: ProofId,
    file_name: String,
    file_size: u64,
    file_type: String,
    full_hash: Fingerprint,
    short_hash: String,
    uploaded_at: DateTime<Utc>,
    transaction_id: Option<TransactionRef>,
}

impl DocumentProof {
    /// Create a fresh, unanchored proof with a new ID stamped now.
    pub fn new(metadata: &FileMetadata, full_hash: Fingerprint) -> Self {
        Self::with_id(ProofId::new(), metadata, full_hash, Utc::now())
    }

    /// Create an unanchored proof with explicit identity and timestamp.
    pub fn with_id(
        id: ProofId,
        metadata: &FileMetadata,
        full_hash: Fingerprint,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            file_name: metadata.name.clone(),
            file_size: metadata.size,
            file_type: metadata.mime_type.clone(),
            full_hash,
            short_hash: full_hash.short_hex(),
            uploaded_at,
            transaction_id: None,
        }
    }

    pub fn id(&self) -> ProofId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn full_hash(&self) -> &Fingerprint {
        &self.full_hash
    }

    pub fn short_hash(&self) -> &str {
        &self.short_hash
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn transaction_id(&self) -> Option<&TransactionRef> {
        self.transaction_id.as_ref()
    }

    pub fn is_anchored(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// Attach a ledger reference, at most once.
    pub fn attach_transaction(&mut self, tx: TransactionRef) -> AnchorAttach {
        match &self.transaction_id {
            None => {
                self.transaction_id = Some(tx);
                AnchorAttach::Attached
            }
            Some(existing) if *existing == tx => AnchorAttach::Unchanged,
            Some(existing) => AnchorAttach::Conflict {
                existing: existing.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> FileMetadata {
        FileMetadata {
            name: "contract.pdf".into(),
            size: 2048,
            mime_type: "application/pdf".into(),
        }
    }

    #[test]
    fn new_proof_is_unanchored_with_short_hash() {
        let fp = Fingerprint::from_digest([0xde; 32]);
        let proof = DocumentProof::new(&metadata(), fp);
        assert!(!proof.is_anchored());
        assert_eq!(proof.short_hash(), "dededede");
        assert_eq!(proof.full_hash(), &fp);
        assert_eq!(proof.file_name(), "contract.pdf");
        assert_eq!(proof.file_size(), 2048);
    }

    #[test]
    fn proof_ids_are_unique() {
        let fp = Fingerprint::from_digest([1; 32]);
        let a = DocumentProof::new(&metadata(), fp);
        let b = DocumentProof::new(&metadata(), fp);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn attach_is_once_only() {
        let mut proof = DocumentProof::new(&metadata(), Fingerprint::from_digest([2; 32]));
        let first = TransactionRef::from_digest(&[1; 32]);
        let second = TransactionRef::from_digest(&[2; 32]);

        assert_eq!(proof.attach_transaction(first.clone()), AnchorAttach::Attached);
        assert_eq!(proof.attach_transaction(first.clone()), AnchorAttach::Unchanged);
        assert_eq!(
            proof.attach_transaction(second),
            AnchorAttach::Conflict {
                existing: first.clone()
            }
        );
        assert_eq!(proof.transaction_id(), Some(&first));
    }

    #[test]
    fn serde_uses_camel_case_layout() {
        let proof = DocumentProof::new(&metadata(), Fingerprint::from_digest([4; 32]));
        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["fileName"], "contract.pdf");
        assert_eq!(value["fullHash"], Fingerprint::from_digest([4; 32]).to_hex());
        assert_eq!(value["shortHash"], "04040404");
        assert!(value["transactionId"].is_null());

        let parsed: DocumentProof = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, proof);
    }

    #[test]
    fn proof_id_parses_display_form() {
        let id = ProofId::new();
        assert_eq!(id.to_string().parse::<ProofId>().unwrap(), id);
        assert!("nope".parse::<ProofId>().is_err());
    }
}
