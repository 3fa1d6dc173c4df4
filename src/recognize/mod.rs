use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;

use crate::Result;

pub mod whisper_cli;

pub use whisper_cli::{WhisperCliFactory, WhisperCliRecognizer};

/// One recognized speech span
#[derive(Debug, Clone)]
pub struct RecognizedSegment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Recognized text
    pub text: String,
}

/// Output of a single recognition run: a finite, forward-only segment stream
/// plus the recognizer's duration estimate for the audio file.
pub struct RecognitionOutput {
    /// Segments in non-decreasing start order. Must be drained fully, the
    /// stream cannot be restarted.
    pub segments: BoxStream<'static, Result<RecognizedSegment>>,

    /// Estimated audio duration in seconds
    pub duration_seconds: f64,
}

/// Speech-to-text capability, invoked once per audio file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<RecognitionOutput>;
}

/// Builds the recognizer for a batch. The model is expensive to load, so the
/// controller calls this at most once per run and reuses the instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecognizerFactory: Send + Sync {
    async fn load(&self, model: &str) -> Result<Box<dyn SpeechRecognizer>>;
}

/// Compute device for the recognizer, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }

    /// Precision paired with the device: float16 on GPU, int8 on CPU
    pub fn compute_type(&self) -> &'static str {
        match self {
            Device::Cpu => "int8",
            Device::Cuda => "float16",
        }
    }

    /// Detect the best available device: cuda when an NVIDIA GPU answers,
    /// cpu otherwise.
    pub async fn detect() -> Self {
        let probe = tokio::process::Command::new("nvidia-smi")
            .arg("-L")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match probe {
            Ok(status) if status.success() => Device::Cuda,
            _ => Device::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_compute_type_pairing() {
        assert_eq!(Device::Cpu.compute_type(), "int8");
        assert_eq!(Device::Cuda.compute_type(), "float16");
    }

    #[test]
    fn test_device_serde() {
        assert_eq!(serde_yaml::to_string(&Device::Cuda).unwrap().trim(), "cuda");
        let device: Device = serde_yaml::from_str("cpu").unwrap();
        assert_eq!(device, Device::Cpu);
    }
}
