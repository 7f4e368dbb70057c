//! Anchoring of document fingerprints on an external, append-only ledger.
//!
//! A fingerprint is carried as the note of a zero-amount transaction that an
//! account sends to itself. The ledger only has to order and timestamp the
//! note; no value moves.
//!
//! The [`AnchoringClient`] drives a strict forward-only protocol:
//!
//! ```text
//! Hashing → Signing → Sending → Confirming → Complete
//!              │          │          │
//!              ▼          ▼          ▼
//!        Failed(UserCancelled | SigningFailed)
//!                   Failed(SubmissionRejected)
//!                              Failed(ConfirmationTimeout)
//! ```
//!
//! Every transition is reported to an [`AnchorObserver`]. Nothing is retried;
//! a failed attempt is re-run from the start by the caller.
//!
//! The external services sit behind two traits:
//! - [`SigningService`] — authorizes (or declines) a transaction
//! - [`LedgerNetwork`] — submits, confirms, and looks up transactions
//!
//! [`LocalSigner`] and [`DevnetLedger`] are in-process implementations used
//! by the CLI and by tests.

pub mod client;
pub mod devnet;
pub mod error;
pub mod signer;
pub mod state;
pub mod traits;
pub mod transaction;

pub use client::{AnchorConfig, AnchorReceipt, AnchoringClient};
pub use devnet::{DevnetConfig, DevnetLedger};
pub use error::{AnchorError, NetworkError, NetworkResult, SignError};
pub use signer::LocalSigner;
pub use state::{AnchorFailure, AnchorObserver, AnchorState, NoopObserver, RecordingObserver};
pub use traits::{Confirmation, LedgerEntry, LedgerNetwork, SigningService};
pub use transaction::{SignedTransaction, Transaction};
