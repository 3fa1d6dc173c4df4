use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::recognize::Device;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool binaries
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Recognizer settings
    #[serde(default)]
    pub recognizer: RecognizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// yt-dlp binary used for metadata resolution and downloads
    pub yt_dlp: String,

    /// ffmpeg binary used for audio extraction
    pub ffmpeg: String,

    /// faster-whisper CLI binary used for speech recognition
    pub whisper: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Compute device override; auto-detected when unset
    pub device: Option<Device>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            whisper: "whisper-ctranslate2".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("video-scribe").join("config.yaml"))
    }
}
