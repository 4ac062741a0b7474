//! Configuration file loading and validation.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Where recordings are persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON document with base64 audio
    Json,
    /// SQLite database, one row per recording
    #[default]
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Microphone settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `voxmemo list-devices`
    /// - device name from `voxmemo list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    48000
}

/// Live waveform settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WaveformConfig {
    /// Logical canvas width
    pub width: u16,
    /// Logical canvas height
    pub height: u16,
    /// Redraws per second
    pub fps: u32,
    /// Fill colour, `#rrggbb` or `#rrggbbaa`
    pub color: String,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
            fps: 60,
            color: "#7eaafad4".to_string(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoxmemoConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl VoxmemoConfig {
    /// Loads and validates the configuration file.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed or holds invalid values
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    /// - If the TOML is malformed or holds invalid values
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: VoxmemoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.waveform.width == 0 || self.waveform.height == 0 {
            return Err(anyhow!("waveform.width and waveform.height must be positive"));
        }
        if !(1..=240).contains(&self.waveform.fps) {
            return Err(anyhow!(
                "waveform.fps must be between 1 and 240, got {}",
                self.waveform.fps
            ));
        }
        if crate::ui::parse_color(&self.waveform.color).is_none() {
            return Err(anyhow!(
                "waveform.color must look like \"#rrggbb\" or \"#rrggbbaa\", got \"{}\"",
                self.waveform.color
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(anyhow!("audio.sample_rate must be positive"));
        }
        Ok(())
    }
}

/// Returns the config file path, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("voxmemo");
    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;
    Ok(config_dir.join("voxmemo.toml"))
}
