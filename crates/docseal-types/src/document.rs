use serde::{Deserialize, Serialize};

/// Mime type used when the caller does not know the document's type.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An in-memory document: the full file contents plus its descriptive name
/// and mime type.
///
/// Documents in this domain are small text/PDF files, so the whole file is
/// held in memory before hashing or encryption.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size of the contents in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Descriptive metadata captured into a proof record.
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            name: self.name.clone(),
            size: self.size(),
            mime_type: self.mime_type.clone(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Descriptive metadata of an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}
