//! Foundation types for DocSeal.
//!
//! This crate provides the identity, fingerprint, and record types shared by
//! every other DocSeal crate. It performs no I/O and no cryptography beyond
//! parsing and formatting.
//!
//! # Key Types
//!
//! - [`Fingerprint`] — 256-bit content digest, rendered as 64 lowercase hex chars
//! - [`ProofId`] — UUID v7 identifier of a proof record
//! - [`DocumentProof`] — the local proof record binding a document to its fingerprint
//! - [`Document`] — an in-memory candidate file (name, mime type, bytes)
//! - [`TransactionRef`] — reference to a transaction on the external ledger
//! - [`AccountAddress`] — ledger account identified by an Ed25519 public key

pub mod document;
pub mod error;
pub mod fingerprint;
pub mod network;
pub mod proof;

pub use document::{Document, FileMetadata};
pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use network::{AccountAddress, Round, TransactionRef};
pub use proof::{AnchorAttach, DocumentProof, ProofId};
