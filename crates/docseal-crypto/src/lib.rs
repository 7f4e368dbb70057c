//! Cryptographic primitives for DocSeal.
//!
//! Provides SHA-256 document fingerprinting, AES-256-GCM at-rest encryption
//! with a fresh key and nonce per document, and Ed25519 signing for ledger
//! transactions.
//!
//! Everything here is a thin wrapper over `sha2`, `aes-gcm` and `ed25519-dalek`.

pub mod hasher;
pub mod signer;
pub mod vault;

pub use hasher::{DocumentHasher, HashError};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
pub use vault::{DecryptedDocument, SealedBytes, Vault, VaultError, VaultKey, VaultNonce};
