use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::enrollment::config_dir;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptureConfig {
    /// How long a recording runs before it auto-stops, in seconds
    #[serde(default = "default_record_duration")]
    pub record_duration_secs: u64,
    /// RMS level below which a captured buffer is flagged as likely silence
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,
}

fn default_record_duration() -> u64 {
    5 // long enough for a spoken passphrase
}

fn default_silence_threshold() -> f32 {
    0.003
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            record_duration_secs: default_record_duration(),
            silence_threshold: default_silence_threshold(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capture: CaptureConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("settings.yaml"))
    }

    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = serde_yaml::from_str(&contents)
                .context("Failed to parse config file")?;

            // Validate configuration after loading
            config.validate()?;

            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            println!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.capture.record_duration_secs == 0 {
            bail!("record_duration_secs must be greater than 0");
        }
        if self.capture.record_duration_secs > 60 {
            bail!("record_duration_secs must be <= 60");
        }

        if self.capture.silence_threshold < 0.0 {
            bail!("silence_threshold must be >= 0.0");
        }
        if self.capture.silence_threshold > 1.0 {
            bail!("silence_threshold must be <= 1.0");
        }

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let dir = config_dir()?;
        fs::create_dir_all(&dir)
            .context("Failed to create config directory")?;

        let config_path = Self::config_path()?;
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, yaml)
            .context("Failed to write config file")?;

        Ok(())
    }
}
