//! Local proof ledger for DocSeal.
//!
//! This crate holds the two independent keyed collections that make up
//! DocSeal's local state:
//! - proof records, keyed by [`ProofId`](docseal_types::ProofId) and kept in
//!   insertion order ([`ProofLedger`])
//! - encrypted document payloads, keyed by the same id space
//!   ([`PayloadStore`])
//!
//! A proof without a payload is valid: a document need not be retained for
//! its fingerprint to remain provable. A payload without a proof is orphaned.
//! Neither collection owns the other, and losing a payload never touches the
//! proof record.
//!
//! # Backends
//!
//! - [`InMemoryProofLedger`] / [`InMemoryPayloadStore`] for tests and embedding
//! - [`JournaledProofLedger`] — replays a CRC-framed journal on open and
//!   appends one record per mutation
//! - [`DirPayloadStore`] — one file per payload, replaced atomically

pub mod error;
pub mod journaled;
pub mod memory;
pub mod payload_dir;
pub mod records;
pub mod traits;

pub use error::{LedgerError, LedgerResult, StoreError, StoreResult};
pub use journaled::JournaledProofLedger;
pub use memory::{InMemoryPayloadStore, InMemoryProofLedger};
pub use payload_dir::DirPayloadStore;
pub use records::{EncryptedPayload, ProofEvent, StoreLimits};
pub use traits::{PayloadStore, ProofLedger};
