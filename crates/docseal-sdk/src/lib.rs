//! High-level SDK for DocSeal.
//!
//! [`Notary`] wires the proof ledger, the encrypted payload store, the
//! anchoring client, and the verifier into the end-to-end flows:
//!
//! 1. **upload**: fingerprint, encrypt, record the proof, keep the payload
//!    (a storage refusal is not fatal)
//! 2. **anchor**: put the fingerprint on the external ledger and record the
//!    transaction reference
//! 3. **verify**: re-hash a candidate and compare with the anchored
//!    fingerprint
//! 4. **open**: decrypt a locally kept document
//!
//! [`NotaryConfig`] carries every tunable and loads from TOML.

pub mod config;
pub mod error;
pub mod notary;

pub use config::NotaryConfig;
pub use error::{SdkError, SdkResult};
pub use notary::{AnchorOutcome, Notary, UploadReceipt};

// Re-export key types
pub use docseal_anchor::{
    AnchorError, AnchorFailure, AnchorObserver, AnchorReceipt, AnchorState, LocalSigner,
    NoopObserver, SignError, SignedTransaction, SigningService, Transaction,
};
pub use docseal_crypto::{DecryptedDocument, SigningKey};
pub use docseal_types::{
    AccountAddress, Document, DocumentProof, Fingerprint, ProofId, TransactionRef,
};
pub use docseal_verify::{VerificationReport, VerifyError};
