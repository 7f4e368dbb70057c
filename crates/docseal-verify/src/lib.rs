//! Tamper verification for DocSeal.
//!
//! A candidate document is re-hashed and compared byte-for-byte with the
//! fingerprint recorded on the external ledger. The ledger is the source of
//! truth: the local proof record only supplies the transaction reference.
//!
//! A tampered document is a successful verification with
//! `is_tampered = true`. Errors mean verification could not be performed.

pub mod error;
pub mod verifier;

pub use error::VerifyError;
pub use verifier::{VerificationReport, Verifier};
