use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::channel::ChannelMode;
use crate::defaults;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub channel: ChannelConfig,
    pub server: ServerConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
}

/// Transcription channel configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    pub mode: ChannelMode,
    pub chunk_interval_ms: u64,
    pub batch_grace_ms: u64,
}

/// Recognizer endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub streaming_url: String,
    pub batch_url: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            mode: ChannelMode::Streaming,
            chunk_interval_ms: defaults::CHUNK_INTERVAL_MS,
            batch_grace_ms: defaults::BATCH_GRACE_MS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            streaming_url: defaults::STREAMING_URL.to_string(),
            batch_url: defaults::BATCH_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - DICTAMERGE_MODE → channel.mode ("streaming" or "batch")
    /// - DICTAMERGE_AUDIO_DEVICE → audio.device
    /// - DICTAMERGE_STREAMING_URL → server.streaming_url
    /// - DICTAMERGE_BATCH_URL → server.batch_url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(mode) = std::env::var("DICTAMERGE_MODE") {
            match mode.as_str() {
                "streaming" => self.channel.mode = ChannelMode::Streaming,
                "batch" => self.channel.mode = ChannelMode::Batch,
                _ => {}
            }
        }

        if let Ok(device) = std::env::var("DICTAMERGE_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(url) = std::env::var("DICTAMERGE_STREAMING_URL")
            && !url.is_empty()
        {
            self.server.streaming_url = url;
        }

        if let Ok(url) = std::env::var("DICTAMERGE_BATCH_URL")
            && !url.is_empty()
        {
            self.server.batch_url = url;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/dictamerge/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("dictamerge")
            .join("config.toml")
    }
}
