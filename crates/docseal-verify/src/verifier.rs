use std::sync::Arc;
use std::time::Duration;

use docseal_anchor::{LedgerNetwork, NetworkError};
use docseal_crypto::{DocumentHasher, HashError};
use docseal_types::{Document, DocumentProof, Fingerprint, TransactionRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::VerifyError;

/// Outcome of comparing a candidate document with its anchored fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub is_tampered: bool,
    pub computed_hash: Fingerprint,
    pub anchored_hash: Fingerprint,
    /// Name recorded in the proof, not the candidate's.
    pub file_name: String,
    pub transaction_id: TransactionRef,
}

/// Verification service over a ledger network.
#[derive(Clone)]
pub struct Verifier {
    network: Arc<dyn LedgerNetwork>,
    lookup_timeout: Duration,
}

impl Verifier {
    pub fn new(network: Arc<dyn LedgerNetwork>, lookup_timeout: Duration) -> Self {
        Self {
            network,
            lookup_timeout,
        }
    }

    /// Re-hash `candidate` and compare it with the fingerprint anchored
    /// under `proof`'s transaction.
    pub async fn verify(
        &self,
        candidate: &Document,
        proof: &DocumentProof,
    ) -> Result<VerificationReport, VerifyError> {
        let tx = proof
            .transaction_id()
            .ok_or(VerifyError::NotAnchored(proof.id()))?;
        let computed = DocumentHasher::hash(&candidate.bytes).map_err(invalid_input)?;
        self.compare(computed, tx, proof).await
    }

    /// Like [`verify`](Self::verify), for a fingerprint computed elsewhere.
    pub async fn verify_fingerprint(
        &self,
        computed: Fingerprint,
        proof: &DocumentProof,
    ) -> Result<VerificationReport, VerifyError> {
        let tx = proof
            .transaction_id()
            .ok_or(VerifyError::NotAnchored(proof.id()))?;
        self.compare(computed, tx, proof).await
    }

    /// Fingerprint recorded on the ledger under `tx`.
    pub async fn anchored_fingerprint(&self, tx: &TransactionRef) -> Result<Fingerprint, VerifyError> {
        let entry = match tokio::time::timeout(self.lookup_timeout, self.network.lookup(tx)).await {
            Err(_) => {
                return Err(VerifyError::LedgerUnavailable(format!(
                    "lookup of {} timed out after {:?}",
                    tx.short(),
                    self.lookup_timeout
                )))
            }
            Ok(Err(NetworkError::NotFound(_))) => {
                return Err(VerifyError::TransactionNotFound(tx.clone()))
            }
            Ok(Err(e)) => return Err(VerifyError::LedgerUnavailable(e.to_string())),
            Ok(Ok(entry)) => entry,
        };

        let note = std::str::from_utf8(&entry.note).map_err(|e| VerifyError::MalformedAnchor {
            tx: tx.clone(),
            reason: format!("note is not UTF-8: {e}"),
        })?;
        let anchored = Fingerprint::from_hex(note).map_err(|e| VerifyError::MalformedAnchor {
            tx: tx.clone(),
            reason: e.to_string(),
        })?;
        // Anchors are written as lowercase hex; any other spelling is not ours.
        if anchored.to_hex() != note {
            return Err(VerifyError::MalformedAnchor {
                tx: tx.clone(),
                reason: "note is not lowercase hex".into(),
            });
        }
        Ok(anchored)
    }

    async fn compare(
        &self,
        computed: Fingerprint,
        tx: &TransactionRef,
        proof: &DocumentProof,
    ) -> Result<VerificationReport, VerifyError> {
        debug!(proof = %proof.id(), tx = %tx.short(), "resolving anchor");
        let anchored = self.anchored_fingerprint(tx).await?;
        let is_tampered = computed != anchored;

        if is_tampered {
            warn!(
                proof = %proof.id(),
                computed = %computed.short_hex(),
                anchored = %anchored.short_hex(),
                "document does not match its anchor"
            );
        } else {
            info!(proof = %proof.id(), tx = %tx.short(), "document matches its anchor");
        }

        Ok(VerificationReport {
            is_tampered,
            computed_hash: computed,
            anchored_hash: anchored,
            file_name: proof.file_name().to_string(),
            transaction_id: tx.clone(),
        })
    }
}

fn invalid_input(e: HashError) -> VerifyError {
    VerifyError::InvalidInput(e.to_string())
}
