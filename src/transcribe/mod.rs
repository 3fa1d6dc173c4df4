use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::progress::{ProgressSink, TranscribeProgress};
use crate::recognize::SpeechRecognizer;
use crate::{PipelineError, Result};

/// One timed segment of recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Segment text
    pub text: String,
}

/// Full transcript of one audio file: the concatenated text plus the ordered
/// timed segments it was assembled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Drain the recognizer's segment stream for one audio file into a
/// transcript, reporting recognized seconds against the duration estimate as
/// each segment arrives. The recognizer is invoked exactly once and never
/// retried here; failures carry the original cause.
pub async fn transcribe_audio(
    recognizer: &dyn SpeechRecognizer,
    audio_path: &Path,
    sink: &(dyn ProgressSink + 'static),
) -> Result<Transcript> {
    let output = recognizer
        .transcribe(audio_path)
        .await
        .map_err(|e| PipelineError::TranscriptionFailed(format!("{e:#}")))?;

    let total_seconds = output.duration_seconds;
    let mut stream = output.segments;
    let mut segments = Vec::new();

    while let Some(next) = stream.next().await {
        let segment = next.map_err(|e| PipelineError::TranscriptionFailed(format!("{e:#}")))?;
        sink.on_transcribe_progress(&TranscribeProgress {
            recognized_seconds: segment.end,
            total_seconds,
        });
        segments.push(TranscriptSegment {
            start: segment.start,
            end: segment.end,
            text: segment.text,
        });
    }
    sink.on_transcribe_finished();

    let text: String = segments.iter().map(|s| s.text.as_str()).collect();
    Ok(Transcript { text, segments })
}
