use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::transcribe::Transcript;
use crate::{PipelineError, Result};

pub mod time;

pub use time::{format_srt_timestamp, format_vtt_timestamp};

/// On-disk subtitle formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubtitleFormat {
    /// Trimmed full text, no timing
    #[default]
    Txt,
    /// SubRip: numbered blocks with `HH:MM:SS,mmm` ranges
    Srt,
    /// WebVTT: `WEBVTT` header, `HH:MM:SS.mmm` ranges
    Vtt,
    /// Canonical machine-readable transcript dump
    Json,
}

impl SubtitleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleFormat::Txt => "txt",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Json => "json",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtitleFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(SubtitleFormat::Txt),
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" => Ok(SubtitleFormat::Vtt),
            "json" => Ok(SubtitleFormat::Json),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for SubtitleFormat {
    type Error = PipelineError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SubtitleFormat> for String {
    fn from(format: SubtitleFormat) -> Self {
        format.as_str().to_string()
    }
}

/// Expected subtitle path for a media file: same folder, same base name,
/// format extension.
pub fn subtitle_path(media_path: &Path, format: SubtitleFormat) -> PathBuf {
    media_path.with_extension(format.as_str())
}

/// Render the transcript in the requested format and write it to `path`,
/// overwriting any existing file. Returns the written path.
pub fn write_subtitle(
    transcript: &Transcript,
    format: SubtitleFormat,
    path: &Path,
) -> Result<PathBuf> {
    let content = match format {
        SubtitleFormat::Txt => transcript.text.trim().to_string(),
        SubtitleFormat::Json => serde_json::to_string_pretty(transcript)
            .context("Failed to serialize transcript to JSON")?,
        SubtitleFormat::Srt => render_srt(transcript),
        SubtitleFormat::Vtt => render_vtt(transcript),
    };

    fs_err::write(path, content)
        .with_context(|| format!("Failed to write subtitle file {}", path.display()))?;

    Ok(path.to_path_buf())
}

fn render_srt(transcript: &Transcript) -> String {
    let mut out = String::new();
    for (idx, segment) in transcript.segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    out
}

fn render_vtt(transcript: &Transcript) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in &transcript.segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    out
}
