//! Append-only journal for DocSeal local state.
//!
//! Records are serialized with bincode, framed with a length prefix and a
//! CRC32 checksum, and appended to a single segment file. Stores replay the
//! journal on open (load-on-start) and append one record per mutation
//! (write-on-mutate). Compaction rewrites the segment through a temporary
//! file and an atomic rename, so a crash never leaves a half-written segment
//! in place.

pub mod error;
pub mod journal;

pub use error::{JournalError, Result};
pub use journal::{Journal, JournalConfig, SyncMode};
