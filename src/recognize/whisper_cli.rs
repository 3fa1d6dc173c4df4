//! faster-whisper CLI recognizer backend.

use anyhow::Context;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{Device, RecognitionOutput, RecognizedSegment, RecognizerFactory, SpeechRecognizer};
use crate::config::Config;
use crate::{PipelineError, Result};

/// Recognizer that shells out to a faster-whisper CLI and parses its JSON
/// result file.
pub struct WhisperCliRecognizer {
    binary: String,
    model: String,
    device: Device,
}

/// Shape of the CLI's JSON output we rely on
#[derive(Debug, Deserialize)]
struct WhisperJson {
    #[serde(default)]
    duration: Option<f64>,
    segments: Vec<WhisperJsonSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperJsonSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperCliRecognizer {
    pub fn new(binary: &str, model: &str, device: Device) -> Self {
        Self {
            binary: binary.to_string(),
            model: model.to_string(),
            device,
        }
    }

    async fn run_cli(&self, audio_path: &Path) -> Result<WhisperJson> {
        let output_dir = audio_path.parent().unwrap_or_else(|| Path::new("."));

        let output = Command::new(&self.binary)
            .args([
                "--model",
                &self.model,
                "--device",
                self.device.as_str(),
                "--compute_type",
                self.device.compute_type(),
                "--output_format",
                "json",
                "--output_dir",
            ])
            .arg(output_dir)
            .arg(audio_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::TranscriptionFailed(stderr.trim().to_string()).into());
        }

        // The CLI names its result after the audio file.
        let json_path = audio_path.with_extension("json");
        let content = fs_err::read_to_string(&json_path)
            .context("Recognizer produced no JSON result file")?;
        // The canonical subtitle dump is written separately by the serializer.
        let _ = fs_err::remove_file(&json_path);

        serde_json::from_str(&content).context("Failed to parse recognizer JSON output")
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperCliRecognizer {
    async fn transcribe(&self, audio_path: &Path) -> Result<RecognitionOutput> {
        tracing::debug!("recognizing {} with model {}", audio_path.display(), self.model);

        let parsed = self.run_cli(audio_path).await?;

        let duration_seconds = parsed
            .duration
            .or_else(|| parsed.segments.last().map(|s| s.end))
            .unwrap_or(0.0);

        let segments = stream::iter(parsed.segments)
            .map(|segment| {
                Ok(RecognizedSegment {
                    start: segment.start,
                    end: segment.end,
                    text: segment.text,
                })
            })
            .boxed();

        Ok(RecognitionOutput {
            segments,
            duration_seconds,
        })
    }
}

/// Factory wiring the CLI recognizer from configuration; the compute device
/// is auto-detected unless the config pins one.
pub struct WhisperCliFactory {
    binary: String,
    device: Option<Device>,
}

impl WhisperCliFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.tools.whisper.clone(),
            device: config.recognizer.device,
        }
    }
}

#[async_trait]
impl RecognizerFactory for WhisperCliFactory {
    async fn load(&self, model: &str) -> Result<Box<dyn SpeechRecognizer>> {
        let device = match self.device {
            Some(device) => device,
            None => Device::detect().await,
        };
        tracing::info!(
            "loading recognizer model '{}' on {} ({})",
            model,
            device.as_str(),
            device.compute_type()
        );
        Ok(Box::new(WhisperCliRecognizer::new(&self.binary, model, device)))
    }
}
