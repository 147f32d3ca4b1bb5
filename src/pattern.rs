/// Pattern-lock authentication
///
/// A pattern is an ordered sequence of unique dot indices on a 3x3 grid.
/// Verification is exact sequence equality against the enrolled pattern.
/// Persisted in its own slot, separate from the voiceprint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::constants::pattern::{GRID_DOTS, MIN_PATTERN_LENGTH};
use crate::enrollment::config_dir;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("connect at least {MIN_PATTERN_LENGTH} dots")]
    TooShort,

    #[error("dot index {0} is outside the 3x3 grid")]
    InvalidDot(u8),

    #[error("dot index {0} appears more than once")]
    RepeatedDot(u8),

    #[error("cannot parse dot index {0:?}")]
    Unparseable(String),

    #[error("no pattern enrolled yet")]
    NotEnrolled,

    #[error("pattern store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Validated dot sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    dots: Vec<u8>,
}

impl Pattern {
    /// Validate a drawn dot sequence: at least four dots, all on the grid,
    /// no dot visited twice.
    pub fn new(dots: Vec<u8>) -> Result<Self, PatternError> {
        if dots.len() < MIN_PATTERN_LENGTH {
            return Err(PatternError::TooShort);
        }
        let mut seen = [false; GRID_DOTS];
        for &dot in &dots {
            if dot as usize >= GRID_DOTS {
                return Err(PatternError::InvalidDot(dot));
            }
            if seen[dot as usize] {
                return Err(PatternError::RepeatedDot(dot));
            }
            seen[dot as usize] = true;
        }
        Ok(Pattern { dots })
    }

    /// Parse the CLI form, digits separated by dashes (e.g. "0-4-8-5")
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let dots = text
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|_| PatternError::Unparseable(part.to_string()))
            })
            .collect::<Result<Vec<u8>, PatternError>>()?;
        Pattern::new(dots)
    }

    pub fn dots(&self) -> &[u8] {
        &self.dots
    }
}

/// Load/save slot for the enrolled pattern
pub trait PatternStore {
    fn load(&self) -> Result<Option<Pattern>>;
    fn save(&self, pattern: &Pattern) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file store at `~/.voiceguard/pattern.json`
pub struct PatternFileStore {
    path: PathBuf,
}

impl PatternFileStore {
    pub fn open_default() -> Result<Self> {
        Ok(PatternFileStore {
            path: config_dir()?.join("pattern.json"),
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        PatternFileStore { path }
    }
}

impl PatternStore for PatternFileStore {
    fn load(&self) -> Result<Option<Pattern>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read pattern file: {}", self.path.display()))?;
        let pattern: Pattern =
            serde_json::from_str(&contents).context("Failed to parse enrolled pattern")?;
        Ok(Some(pattern))
    }

    fn save(&self, pattern: &Pattern) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create pattern directory")?;
        }
        let json = serde_json::to_string(pattern).context("Failed to serialize pattern")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write pattern file: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove pattern file: {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-process store for tests
#[derive(Default)]
pub struct PatternMemoryStore {
    pattern: Mutex<Option<Pattern>>,
}

impl PatternMemoryStore {
    pub fn new() -> Self {
        PatternMemoryStore::default()
    }
}

impl PatternStore for PatternMemoryStore {
    fn load(&self) -> Result<Option<Pattern>> {
        Ok(self.pattern.lock().unwrap().clone())
    }

    fn save(&self, pattern: &Pattern) -> Result<()> {
        *self.pattern.lock().unwrap() = Some(pattern.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.pattern.lock().unwrap() = None;
        Ok(())
    }
}

pub fn enroll(store: &dyn PatternStore, pattern: &Pattern) -> Result<(), PatternError> {
    store.save(pattern)?;
    Ok(())
}

/// Exact-equality check against the enrolled pattern
pub fn verify(store: &dyn PatternStore, attempt: &Pattern) -> Result<bool, PatternError> {
    let enrolled = store.load()?.ok_or(PatternError::NotEnrolled)?;
    Ok(enrolled == *attempt)
}

pub fn clear(store: &dyn PatternStore) -> Result<(), PatternError> {
    store.clear()?;
    Ok(())
}
