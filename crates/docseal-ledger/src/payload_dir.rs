use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use docseal_types::ProofId;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::records::{EncryptedPayload, StoreLimits};
use crate::traits::PayloadStore;

const EXTENSION: &str = "payload";

/// Payload store keeping one bincode file per proof id.
///
/// Files are written to a temporary file in the same directory and renamed
/// into place, so a reader sees the old payload or the new one, never a
/// partial write.
pub struct DirPayloadStore {
    dir: PathBuf,
    limits: StoreLimits,
    /// Serialises writers so the capacity check and the write are atomic.
    write_lock: RwLock<()>,
}

impl DirPayloadStore {
    /// Open (or create) a payload directory.
    pub fn open(dir: &Path, limits: StoreLimits) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            limits,
            write_lock: RwLock::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ProofId) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", id.as_uuid()))
    }

    /// Bytes used by payload files, excluding `skip`.
    fn used_bytes(&self, skip: &Path) -> StoreResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }
}

impl PayloadStore for DirPayloadStore {
    fn put(&self, id: &ProofId, payload: &EncryptedPayload) -> StoreResult<()> {
        let encoded =
            bincode::serialize(payload).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let size = encoded.len() as u64;
        let target = self.path_for(id);

        let _guard = self.write_lock.write().map_err(|_| StoreError::Poisoned)?;
        let current = self.used_bytes(&target)?;
        if let Err((size, limit)) = self.limits.check(size, current) {
            warn!(proof = %id, size, limit, "payload rejected: capacity exceeded");
            return Err(StoreError::CapacityExceeded { size, limit });
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        debug!(proof = %id, size, "payload stored");
        Ok(())
    }

    fn get(&self, id: &ProofId) -> StoreResult<Option<EncryptedPayload>> {
        let _guard = self.write_lock.read().map_err(|_| StoreError::Poisoned)?;
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                id: *id,
                reason: e.to_string(),
            })
    }

    fn remove(&self, id: &ProofId) -> StoreResult<bool> {
        let _guard = self.write_lock.write().map_err(|_| StoreError::Poisoned)?;
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, id: &ProofId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_crypto::Vault;

    fn payload(bytes: &[u8]) -> EncryptedPayload {
        EncryptedPayload::from_sealed(Vault::encrypt(bytes).unwrap(), "application/pdf")
    }

    #[test]
    fn put_get_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = ProofId::new();
        let stored = payload(b"%PDF-1.7 contract");
        DirPayloadStore::open(dir.path(), StoreLimits::unlimited())
            .unwrap()
            .put(&id, &stored)
            .unwrap();

        let store = DirPayloadStore::open(dir.path(), StoreLimits::unlimited()).unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.open().unwrap().bytes, b"%PDF-1.7 contract");
    }

    #[test]
    fn missing_payload_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirPayloadStore::open(dir.path(), StoreLimits::unlimited()).unwrap();
        assert!(store.get(&ProofId::new()).unwrap().is_none());
        assert!(!store.remove(&ProofId::new()).unwrap());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirPayloadStore::open(dir.path(), StoreLimits::unlimited()).unwrap();
        let id = ProofId::new();
        fs::write(store.path_for(&id), b"\x01").unwrap();
        assert!(matches!(store.get(&id), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn total_capacity_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let probe = bincode::serialize(&payload(&[0u8; 32])).unwrap().len() as u64;
        let store = DirPayloadStore::open(
            dir.path(),
            StoreLimits {
                max_payload_bytes: None,
                max_total_bytes: Some(probe * 2),
            },
        )
        .unwrap();

        let first = ProofId::new();
        store.put(&first, &payload(&[0u8; 32])).unwrap();
        store.put(&ProofId::new(), &payload(&[1u8; 32])).unwrap();
        // Replacing an existing payload does not count it twice.
        store.put(&first, &payload(&[2u8; 32])).unwrap();

        let overflow = ProofId::new();
        assert!(matches!(
            store.put(&overflow, &payload(&[3u8; 32])),
            Err(StoreError::CapacityExceeded { .. })
        ));
        assert!(!store.contains(&overflow).unwrap());
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirPayloadStore::open(dir.path(), StoreLimits::unlimited()).unwrap();
        let id = ProofId::new();
        store.put(&id, &payload(b"x")).unwrap();
        assert!(store.contains(&id).unwrap());
        assert!(store.remove(&id).unwrap());
        assert!(!store.contains(&id).unwrap());
    }
}
