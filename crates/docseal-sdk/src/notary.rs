use std::sync::Arc;

use docseal_anchor::{
    AnchorError, AnchorObserver, AnchorReceipt, AnchoringClient, DevnetLedger, LedgerNetwork,
    SigningService,
};
use docseal_crypto::{DecryptedDocument, DocumentHasher, Vault};
use docseal_ledger::{
    DirPayloadStore, EncryptedPayload, JournaledProofLedger, PayloadStore, ProofLedger,
};
use docseal_types::document::DEFAULT_MIME_TYPE;
use docseal_types::{Document, DocumentProof, Fingerprint, ProofId};
use docseal_verify::{VerificationReport, Verifier, VerifyError};
use tracing::{debug, info, warn};

use crate::config::NotaryConfig;
use crate::error::{SdkError, SdkResult};

/// What happened to the anchoring step of an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// Anchoring was not requested.
    Skipped,
    Anchored(AnchorReceipt),
    /// The proof was kept locally but is not anchored.
    Failed(AnchorError),
}

/// Result of storing a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub proof: DocumentProof,
    /// Whether the encrypted contents were kept. A `false` here leaves the
    /// proof fully usable for verification.
    pub payload_stored: bool,
    pub anchor: AnchorOutcome,
}

/// High-level notary API: proof ledger, payload store, anchoring, and
/// verification behind one handle.
pub struct Notary {
    ledger: Arc<dyn ProofLedger>,
    payloads: Arc<dyn PayloadStore>,
    anchoring: AnchoringClient,
    verifier: Verifier,
}

impl Notary {
    pub fn new(
        ledger: Arc<dyn ProofLedger>,
        payloads: Arc<dyn PayloadStore>,
        anchoring: AnchoringClient,
        verifier: Verifier,
    ) -> Self {
        Self {
            ledger,
            payloads,
            anchoring,
            verifier,
        }
    }

    /// Notary over local state under `config.data_dir` and a persistent
    /// devnet ledger.
    pub fn open_local(config: &NotaryConfig, signer: Arc<dyn SigningService>) -> SdkResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let ledger = JournaledProofLedger::open(&config.proofs_journal_path(), config.journal_config())?;
        let payloads = DirPayloadStore::open(&config.payload_dir(), config.store_limits())?;
        let network: Arc<dyn LedgerNetwork> = Arc::new(DevnetLedger::open(
            &config.devnet_journal_path(),
            config.devnet_config(),
            config.journal_config(),
        )?);
        let proofs = ledger.len()?;
        info!(data_dir = %config.data_dir.display(), proofs, "notary opened");

        Ok(Self::new(
            Arc::new(ledger),
            Arc::new(payloads),
            AnchoringClient::new(signer, network.clone(), config.anchor_config()),
            Verifier::new(network, config.lookup_timeout()),
        ))
    }

    /// Fingerprint a document, record its proof, and keep its encrypted
    /// contents when storage allows.
    pub async fn upload(&self, document: Document) -> SdkResult<UploadReceipt> {
        let mut metadata = document.metadata();
        if metadata.mime_type.trim().is_empty() {
            metadata.mime_type = DEFAULT_MIME_TYPE.to_string();
        }

        let bytes = document.bytes;
        let (fingerprint, sealed) = blocking(move || -> SdkResult<_> {
            let fingerprint = DocumentHasher::hash(&bytes)?;
            let sealed = Vault::encrypt(&bytes)?;
            Ok((fingerprint, sealed))
        })
        .await??;

        let proof = self.ledger.create(&metadata, fingerprint)?;
        let payload = EncryptedPayload::from_sealed(sealed, metadata.mime_type.clone());
        let payload_stored = match self.payloads.put(&proof.id(), &payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(proof = %proof.id(), error = %e, "document not stored locally; proof kept");
                false
            }
        };

        Ok(UploadReceipt {
            proof,
            payload_stored,
            anchor: AnchorOutcome::Skipped,
        })
    }

    /// Anchor an existing, not yet anchored proof.
    pub async fn anchor(
        &self,
        id: &ProofId,
        observer: &dyn AnchorObserver,
    ) -> SdkResult<(DocumentProof, AnchorReceipt)> {
        let proof = self.proof(id)?;
        self.anchor_proof(&proof, observer).await
    }

    /// [`upload`](Self::upload) followed by anchoring.
    ///
    /// An anchoring failure keeps the local proof and is reported in the
    /// receipt rather than as an error.
    pub async fn upload_and_anchor(
        &self,
        document: Document,
        observer: &dyn AnchorObserver,
    ) -> SdkResult<UploadReceipt> {
        let mut receipt = self.upload(document).await?;
        match self.anchor_proof(&receipt.proof, observer).await {
            Ok((proof, anchored)) => {
                receipt.proof = proof;
                receipt.anchor = AnchorOutcome::Anchored(anchored);
            }
            Err(SdkError::Anchor(e)) => {
                warn!(proof = %receipt.proof.id(), error = %e, "upload kept, anchoring failed");
                receipt.anchor = AnchorOutcome::Failed(e);
            }
            Err(e) => return Err(e),
        }
        Ok(receipt)
    }

    /// Check a candidate document against the fingerprint anchored for `id`.
    pub async fn verify(&self, id: &ProofId, candidate: Document) -> SdkResult<VerificationReport> {
        let proof = self.proof(id)?;
        if !proof.is_anchored() {
            return Err(VerifyError::NotAnchored(*id).into());
        }
        let bytes = candidate.bytes;
        let computed: Fingerprint = blocking(move || DocumentHasher::hash(&bytes)).await??;
        Ok(self.verifier.verify_fingerprint(computed, &proof).await?)
    }

    /// Decrypt the locally stored contents of a proof's document.
    pub async fn open(&self, id: &ProofId) -> SdkResult<DecryptedDocument> {
        let payload = self
            .payloads
            .get(id)?
            .ok_or(SdkError::PayloadNotFound(*id))?;
        let document = blocking(move || payload.open()).await??;
        debug!(proof = %id, size = document.bytes.len(), "document opened");
        Ok(document)
    }

    /// All proofs, oldest first.
    pub fn proofs(&self) -> SdkResult<Vec<DocumentProof>> {
        Ok(self.ledger.list()?)
    }

    pub fn proof(&self, id: &ProofId) -> SdkResult<DocumentProof> {
        self.ledger.get(id)?.ok_or(SdkError::ProofNotFound(*id))
    }

    /// Resolve a full or abbreviated proof id against the ledger.
    pub fn find_proof(&self, prefix: &str) -> SdkResult<DocumentProof> {
        let needle = prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(SdkError::Input("empty proof id".into()));
        }
        let mut matches = self
            .proofs()?
            .into_iter()
            .filter(|p| p.id().to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(proof), None) => Ok(proof),
            (None, _) => Err(SdkError::Input(format!("no proof matches '{prefix}'"))),
            (Some(_), Some(_)) => Err(SdkError::Input(format!("'{prefix}' is ambiguous"))),
        }
    }

    async fn anchor_proof(
        &self,
        proof: &DocumentProof,
        observer: &dyn AnchorObserver,
    ) -> SdkResult<(DocumentProof, AnchorReceipt)> {
        if let Some(existing) = proof.transaction_id() {
            return Err(SdkError::AlreadyAnchored {
                id: proof.id(),
                transaction_id: existing.clone(),
            });
        }
        let receipt = self.anchoring.anchor(proof.full_hash(), observer).await?;
        let updated = self
            .ledger
            .set_transaction_id(&proof.id(), &receipt.transaction_id)?;
        Ok((updated, receipt))
    }
}

/// Run CPU-bound work off the async executor.
async fn blocking<T, F>(work: F) -> SdkResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SdkError::Internal(e.to_string()))
}
