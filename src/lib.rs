//! Video Scribe - batch video acquisition and speech transcription
//!
//! This library downloads remote videos, derives audio from them, transcribes
//! the speech and writes time-aligned subtitle files in txt, srt, vtt or json
//! format. Acquisition and transcription run as two strictly sequential
//! phases, and failures are isolated per item: one bad URL or one corrupt
//! media file never aborts a batch.

pub mod acquire;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod recognize;
pub mod request;
pub mod subtitle;
pub mod transcode;
pub mod transcribe;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use pipeline::{BatchResult, PipelineController, TranscriptOutcome};
pub use request::BatchRequest;
pub use subtitle::SubtitleFormat;
pub use transcribe::{Transcript, TranscriptSegment};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Audio extraction failed: {0}")]
    AudioExtractionFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),
}
