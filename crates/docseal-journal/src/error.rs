use std::io;

/// Errors produced by the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// I/O error during journal file operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A single record exceeds the framing limit.
    #[error("record of {0} bytes exceeds the journal frame limit")]
    RecordTooLarge(usize),

    /// The writer lock was poisoned by a panicking writer.
    #[error("journal writer lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the journal crate.
pub type Result<T> = std::result::Result<T, JournalError>;
