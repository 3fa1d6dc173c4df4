use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::{PipelineError, Result};

/// Audio derivation capability. Implementations produce a single-channel
/// 16 kHz PCM WAV file next to the video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn extract_audio(&self, video_path: &Path) -> Result<PathBuf>;
}

/// Transcoder that shells out to ffmpeg
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn extract_audio(&self, video_path: &Path) -> Result<PathBuf> {
        let audio_path = video_path.with_extension("wav");
        tracing::debug!("extracting audio to {}", audio_path.display());

        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(&audio_path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::AudioExtractionFailed(format!(
                "{}: {}",
                video_path.display(),
                stderr.trim()
            ))
            .into());
        }

        Ok(audio_path)
    }
}
