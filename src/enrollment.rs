/// Enrollment persistence
///
/// A single well-known slot holds at most one `EnrollmentRecord` per
/// user/device; re-enrollment overwrites it, reset deletes it. The store is
/// an explicit injectable interface instead of ambient state, so the
/// computational core never touches disk and tests run against memory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::features::FeatureSet;

/// The only persisted entity: the voiceprint and when it was enrolled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub features: FeatureSet,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl EnrollmentRecord {
    pub fn new(features: FeatureSet) -> Self {
        EnrollmentRecord {
            features,
            timestamp: now_millis(),
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Load/save slot for the enrollment record. Last write wins, no versioning.
pub trait EnrollmentStore {
    fn load(&self) -> Result<Option<EnrollmentRecord>>;
    fn save(&self, record: &EnrollmentRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file store under the application config directory
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at the default slot, `~/.voiceguard/enrollment.json`
    pub fn open_default() -> Result<Self> {
        Ok(FileStore {
            path: config_dir()?.join("enrollment.json"),
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        FileStore { path }
    }
}

impl EnrollmentStore for FileStore {
    fn load(&self) -> Result<Option<EnrollmentRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read enrollment file: {}", self.path.display()))?;
        let record: EnrollmentRecord = serde_json::from_str(&contents)
            .context("Failed to parse enrollment record (reset to re-enroll)")?;
        Ok(Some(record))
    }

    fn save(&self, record: &EnrollmentRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create enrollment directory")?;
        }
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize enrollment record")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write enrollment file: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove enrollment file: {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-process store for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<EnrollmentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl EnrollmentStore for MemoryStore {
    fn load(&self) -> Result<Option<EnrollmentRecord>> {
        Ok(self.record.lock().unwrap().clone())
    }

    fn save(&self, record: &EnrollmentRecord) -> Result<()> {
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

/// Application data directory, `~/.voiceguard`
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".voiceguard"))
}
