use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::subtitle::SubtitleFormat;
use crate::PipelineError;

/// One batch invocation, parsed from the opaque JSON argument.
///
/// Field names mirror the wire payload; everything but `urls` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Video URLs, processed in request order
    pub urls: Vec<String>,

    /// Directory the per-video folders are created under
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Recognizer model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Whether to transcribe after downloading
    #[serde(default = "default_true")]
    pub transcribe: bool,

    /// Subtitle output format
    #[serde(default)]
    pub subtitle_format: SubtitleFormat,

    /// Also fetch source-provided subtitles during download
    #[serde(default)]
    pub download_subtitle: bool,

    /// Overwrite subtitle files that already exist
    #[serde(default = "default_true")]
    pub overwrite_subtitle: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_model() -> String {
    "small".to_string()
}

fn default_true() -> bool {
    true
}

impl BatchRequest {
    /// Parse and validate the JSON payload. Fails before any I/O happens.
    pub fn from_json(payload: &str) -> Result<Self, PipelineError> {
        let request: BatchRequest = serde_json::from_str(payload)
            .map_err(|e| PipelineError::InvalidRequest(format!("failed to parse payload: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    /// A request with an empty URL list is rejected outright.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.urls.is_empty() {
            return Err(PipelineError::InvalidRequest("URL list is empty".to_string()));
        }
        Ok(())
    }
}
