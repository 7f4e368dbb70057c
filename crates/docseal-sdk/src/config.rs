use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docseal_anchor::{AnchorConfig, DevnetConfig};
use docseal_journal::{JournalConfig, SyncMode};
use docseal_ledger::StoreLimits;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

const PROOFS_JOURNAL: &str = "proofs.journal";
const PAYLOAD_DIR: &str = "payloads";
const DEVNET_JOURNAL: &str = "devnet.journal";
const SIGNER_KEY: &str = "signer.key";

/// Notary settings, loaded from TOML. Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotaryConfig {
    /// Root of all local state.
    pub data_dir: PathBuf,
    pub anchoring: AnchoringSettings,
    pub verification: VerificationSettings,
    pub storage: StorageSettings,
    pub devnet: DevnetSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchoringSettings {
    pub confirmation_rounds: u64,
    pub submit_timeout_ms: u64,
    pub validity_rounds: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    pub lookup_timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Largest encrypted payload kept locally. Larger documents keep their
    /// proof but not their contents.
    pub max_payload_bytes: Option<u64>,
    pub max_total_bytes: Option<u64>,
    pub sync_every_write: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevnetSettings {
    pub genesis_id: String,
    pub finality_delay_rounds: u64,
    pub round_interval_ms: u64,
    pub max_note_bytes: usize,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".docseal"),
            anchoring: AnchoringSettings::default(),
            verification: VerificationSettings::default(),
            storage: StorageSettings::default(),
            devnet: DevnetSettings::default(),
        }
    }
}

impl Default for AnchoringSettings {
    fn default() -> Self {
        let defaults = AnchorConfig::default();
        Self {
            confirmation_rounds: defaults.confirmation_rounds,
            submit_timeout_ms: defaults.submit_timeout.as_millis() as u64,
            validity_rounds: defaults.validity_rounds,
        }
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 10_000,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: Some(5 * 1024 * 1024),
            max_total_bytes: None,
            sync_every_write: true,
        }
    }
}

impl Default for DevnetSettings {
    fn default() -> Self {
        let defaults = DevnetConfig::default();
        Self {
            genesis_id: defaults.genesis_id,
            finality_delay_rounds: defaults.finality_delay_rounds,
            round_interval_ms: defaults.round_interval.as_millis() as u64,
            max_note_bytes: defaults.max_note_bytes,
        }
    }
}

impl NotaryConfig {
    /// Read a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SdkError::Config(format!("cannot read {}: {e}", path.display()))),
        }
    }

    pub fn from_toml(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn proofs_journal_path(&self) -> PathBuf {
        self.data_dir.join(PROOFS_JOURNAL)
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.data_dir.join(PAYLOAD_DIR)
    }

    pub fn devnet_journal_path(&self) -> PathBuf {
        self.data_dir.join(DEVNET_JOURNAL)
    }

    pub fn signer_key_path(&self) -> PathBuf {
        self.data_dir.join(SIGNER_KEY)
    }

    pub fn anchor_config(&self) -> AnchorConfig {
        AnchorConfig {
            confirmation_rounds: self.anchoring.confirmation_rounds,
            submit_timeout: Duration::from_millis(self.anchoring.submit_timeout_ms),
            validity_rounds: self.anchoring.validity_rounds,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.verification.lookup_timeout_ms)
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_payload_bytes: self.storage.max_payload_bytes,
            max_total_bytes: self.storage.max_total_bytes,
        }
    }

    pub fn journal_config(&self) -> JournalConfig {
        JournalConfig {
            sync_mode: if self.storage.sync_every_write {
                SyncMode::EveryWrite
            } else {
                SyncMode::OsDefault
            },
        }
    }

    pub fn devnet_config(&self) -> DevnetConfig {
        DevnetConfig {
            genesis_id: self.devnet.genesis_id.clone(),
            finality_delay_rounds: self.devnet.finality_delay_rounds,
            round_interval: Duration::from_millis(self.devnet.round_interval_ms),
            max_note_bytes: self.devnet.max_note_bytes,
        }
    }
}
