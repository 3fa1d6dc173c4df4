use console::style;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::acquire::{self, AcquiredItem};
use crate::config::Config;
use crate::fetch::{FetcherRegistry, MediaFetcher};
use crate::progress::{ConsoleProgress, ProgressSink};
use crate::recognize::{RecognizerFactory, SpeechRecognizer, WhisperCliFactory};
use crate::request::BatchRequest;
use crate::subtitle::{self, SubtitleFormat};
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::transcribe::transcribe_audio;
use crate::Result;

/// Fate of one acquired item after the transcription phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptOutcome {
    pub title: String,
    pub url: String,

    /// Path of the written subtitle file, absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SubtitleFormat>,

    /// Failure description, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptOutcome {
    fn done(item: &AcquiredItem, path: PathBuf, format: SubtitleFormat) -> Self {
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            transcript: Some(path),
            format: Some(format),
            error: None,
        }
    }

    fn failed(item: &AcquiredItem, error: String) -> Self {
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            transcript: None,
            format: None,
            error: Some(error),
        }
    }
}

/// Final result of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub message: String,

    /// URLs materialized on disk, in request order
    pub downloaded: Vec<String>,

    /// One outcome per acquired item, in queue order
    pub transcripts: Vec<TranscriptOutcome>,
}

impl BatchResult {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            downloaded: Vec::new(),
            transcripts: Vec::new(),
        }
    }
}

/// Orchestrates the two pipeline phases: acquisition of every URL first,
/// then audio extraction, transcription and subtitle serialization per item.
pub struct PipelineController {
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Arc<dyn Transcoder>,
    recognizer_factory: Arc<dyn RecognizerFactory>,
    sink: Arc<dyn ProgressSink>,
}

impl PipelineController {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        transcoder: Arc<dyn Transcoder>,
        recognizer_factory: Arc<dyn RecognizerFactory>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            recognizer_factory,
            sink,
        }
    }

    /// Controller wired with the default collaborators: yt-dlp/direct
    /// fetchers, ffmpeg transcoder and the faster-whisper CLI recognizer.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(FetcherRegistry::with_defaults(config)),
            Arc::new(FfmpegTranscoder::new(&config.tools.ffmpeg)),
            Arc::new(WhisperCliFactory::new(config)),
            Arc::new(ConsoleProgress::new()),
        )
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Parse the opaque JSON payload and run the batch. A malformed payload
    /// yields a failed result before any I/O, never partial work.
    pub async fn run_json(&self, payload: &str) -> Result<BatchResult> {
        match BatchRequest::from_json(payload) {
            Ok(request) => self.run(request).await,
            Err(err) => Ok(BatchResult::failed(err.to_string())),
        }
    }

    /// Run one batch: validate, acquire every URL, then transcribe each
    /// acquired item. Per-item failures are recorded, never batch-fatal.
    pub async fn run(&self, request: BatchRequest) -> Result<BatchResult> {
        if let Err(err) = request.validate() {
            return Ok(BatchResult::failed(err.to_string()));
        }

        fs_err::create_dir_all(&request.output)?;

        banner("Downloading videos...");
        let source_subtitles = request.download_subtitle.then_some(request.subtitle_format);
        let report = acquire::acquire(
            self.fetcher.as_ref(),
            &request.urls,
            &request.output,
            source_subtitles,
            self.sink.as_ref(),
        )
        .await;

        if !request.transcribe {
            banner("Download complete (transcription skipped)");
            return Ok(BatchResult {
                success: true,
                message: format!(
                    "downloaded {} videos (transcription skipped)",
                    report.downloaded.len()
                ),
                downloaded: report.downloaded,
                transcripts: Vec::new(),
            });
        }

        banner(&format!("Transcribing {} videos...", report.items.len()));

        // The recognizer model is loaded lazily, at most once, and reused
        // across every item in the batch.
        let mut recognizer: Option<Box<dyn SpeechRecognizer>> = None;
        let total = report.items.len();
        let mut transcripts = Vec::with_capacity(total);

        for (idx, item) in report.items.iter().enumerate() {
            let outcome = self
                .process_item(item, idx + 1, total, &request, &mut recognizer)
                .await;
            transcripts.push(outcome);
        }

        let produced = transcripts.iter().filter(|t| t.transcript.is_some()).count();
        Ok(BatchResult {
            success: true,
            message: format!(
                "downloaded {} videos, produced {} transcripts",
                report.downloaded.len(),
                produced
            ),
            downloaded: report.downloaded,
            transcripts,
        })
    }

    async fn process_item(
        &self,
        item: &AcquiredItem,
        index: usize,
        total: usize,
        request: &BatchRequest,
        recognizer: &mut Option<Box<dyn SpeechRecognizer>>,
    ) -> TranscriptOutcome {
        let subtitle_path = subtitle::subtitle_path(&item.video_path, request.subtitle_format);

        if subtitle_path.exists() && !request.overwrite_subtitle {
            tracing::info!(
                "[{}/{}] subtitle already present, skipping transcription: {}",
                index,
                total,
                item.title
            );
            return TranscriptOutcome::done(item, subtitle_path, request.subtitle_format);
        }

        match self
            .transcribe_item(item, index, total, request, &subtitle_path, recognizer)
            .await
        {
            Ok(path) => {
                tracing::info!("[{}/{}] transcription complete: {}", index, total, item.title);
                TranscriptOutcome::done(item, path, request.subtitle_format)
            }
            Err(err) => {
                tracing::warn!("transcription failed for {}: {:#}", item.title, err);
                TranscriptOutcome::failed(item, format!("{err:#}"))
            }
        }
    }

    async fn transcribe_item(
        &self,
        item: &AcquiredItem,
        index: usize,
        total: usize,
        request: &BatchRequest,
        subtitle_path: &std::path::Path,
        recognizer: &mut Option<Box<dyn SpeechRecognizer>>,
    ) -> Result<PathBuf> {
        tracing::info!("[{}/{}] extracting audio: {}", index, total, item.title);
        let audio_path = self.transcoder.extract_audio(&item.video_path).await?;

        if recognizer.is_none() {
            *recognizer = Some(self.recognizer_factory.load(&request.model).await?);
        }
        let Some(model) = recognizer.as_deref() else {
            // Populated just above; a None here means the factory lied.
            anyhow::bail!("recognizer unavailable");
        };

        tracing::info!("[{}/{}] transcribing: {}", index, total, item.title);
        let transcript = transcribe_audio(model, &audio_path, self.sink.as_ref()).await?;

        subtitle::write_subtitle(&transcript, request.subtitle_format, subtitle_path)
    }
}

fn banner(text: &str) {
    let rule = "=".repeat(50);
    println!("{}", style(&rule).dim());
    println!("{}", style(text).bold());
    println!("{}", style(&rule).dim());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MockMediaFetcher, VideoMetadata};
    use crate::progress::NullProgress;
    use crate::recognize::{
        MockRecognizerFactory, MockSpeechRecognizer, RecognitionOutput, RecognizedSegment,
    };
    use crate::transcode::MockTranscoder;
    use futures_util::stream::{self, StreamExt};
    use std::path::Path;

    fn request(payload: &str) -> BatchRequest {
        BatchRequest::from_json(payload).unwrap()
    }

    /// Fetcher that "downloads" by touching `<stem>.mp4` in the folder.
    fn stub_fetcher(titles: &[(&str, &str)]) -> MockMediaFetcher {
        let mut fetcher = MockMediaFetcher::new();
        let pairs: Vec<(String, String)> = titles
            .iter()
            .map(|(url, title)| (url.to_string(), title.to_string()))
            .collect();
        fetcher.expect_resolve_metadata().returning(move |url| {
            let title = pairs
                .iter()
                .find(|(u, _)| u == url)
                .map(|(_, t)| t.clone())
                .ok_or_else(|| anyhow::anyhow!("video unavailable: {url}"))?;
            Ok(VideoMetadata {
                title,
                ext: "mp4".to_string(),
            })
        });
        fetcher.expect_download().returning(|_, dest_dir, options, _| {
            let path = dest_dir.join(format!("{}.mp4", options.file_stem));
            fs_err::write(&path, b"video")?;
            Ok(path)
        });
        fetcher
    }

    /// Transcoder that touches the wav file instead of running ffmpeg.
    fn stub_transcoder() -> MockTranscoder {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_audio().returning(|video_path| {
            let audio_path = video_path.with_extension("wav");
            fs_err::write(&audio_path, b"audio")?;
            Ok(audio_path)
        });
        transcoder
    }

    fn stub_factory(segments: Vec<(f64, f64, &'static str)>, loads: usize) -> MockRecognizerFactory {
        let mut factory = MockRecognizerFactory::new();
        factory.expect_load().times(loads).returning(move |_| {
            let segments = segments.clone();
            let mut recognizer = MockSpeechRecognizer::new();
            recognizer.expect_transcribe().returning(move |_| {
                let items: Vec<_> = segments
                    .iter()
                    .map(|&(start, end, text)| {
                        Ok(RecognizedSegment {
                            start,
                            end,
                            text: text.to_string(),
                        })
                    })
                    .collect();
                Ok(RecognitionOutput {
                    segments: stream::iter(items).boxed(),
                    duration_seconds: 3.0,
                })
            });
            Ok(Box::new(recognizer) as Box<dyn crate::recognize::SpeechRecognizer>)
        });
        factory
    }

    fn controller(
        fetcher: MockMediaFetcher,
        transcoder: MockTranscoder,
        factory: MockRecognizerFactory,
    ) -> PipelineController {
        PipelineController::new(
            Arc::new(fetcher),
            Arc::new(transcoder),
            Arc::new(factory),
            Arc::new(NullProgress),
        )
    }

    #[tokio::test]
    async fn test_empty_url_list_fails_without_side_effects() {
        let controller = controller(
            MockMediaFetcher::new(),
            MockTranscoder::new(),
            MockRecognizerFactory::new(),
        );

        let result = controller.run_json(r#"{"urls":[],"output":"./x"}"#).await.unwrap();

        assert!(!result.success);
        assert!(result.downloaded.is_empty());
        assert!(result.transcripts.is_empty());
        assert!(!Path::new("./x").exists());
    }

    #[tokio::test]
    async fn test_malformed_payload_fails() {
        let controller = controller(
            MockMediaFetcher::new(),
            MockTranscoder::new(),
            MockRecognizerFactory::new(),
        );

        let result = controller.run_json("{oops").await.unwrap();

        assert!(!result.success);
        assert!(result.message.contains("Invalid request"));
    }

    #[tokio::test]
    async fn test_download_only_batch_skips_transcription() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1"],"output":{:?},"transcribe":false}}"#,
            dir.path().to_str().unwrap()
        );
        let controller = controller(
            stub_fetcher(&[("u1", "Clip")]),
            MockTranscoder::new(),
            MockRecognizerFactory::new(),
        );

        let result = controller.run_json(&payload).await.unwrap();

        assert!(result.success);
        assert_eq!(result.downloaded, vec!["u1".to_string()]);
        assert!(result.transcripts.is_empty());
        assert!(result.message.contains("transcription skipped"));
    }

    #[tokio::test]
    async fn test_srt_batch_produces_expected_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1"],"output":{:?},"subtitle_format":"srt"}}"#,
            dir.path().to_str().unwrap()
        );
        let controller = controller(
            stub_fetcher(&[("u1", "Clip")]),
            stub_transcoder(),
            stub_factory(vec![(0.0, 1.5, "Hi "), (1.5, 3.0, "there.")], 1),
        );

        let result = controller.run_json(&payload).await.unwrap();

        assert!(result.success);
        assert_eq!(result.transcripts.len(), 1);
        let outcome = &result.transcripts[0];
        assert!(outcome.error.is_none());
        assert_eq!(outcome.format, Some(SubtitleFormat::Srt));

        let content = fs_err::read_to_string(outcome.transcript.as_ref().unwrap()).unwrap();
        assert_eq!(
            content,
            "1\n00:00:00,000 --> 00:00:01,500\nHi\n\n2\n00:00:01,500 --> 00:00:03,000\nthere.\n\n"
        );
        assert!(result.message.contains("1 videos"));
        assert!(result.message.contains("1 transcripts"));
    }

    #[tokio::test]
    async fn test_model_loaded_once_for_many_items() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1","u2"],"output":{:?}}}"#,
            dir.path().to_str().unwrap()
        );
        // times(1) on the factory asserts single model construction.
        let controller = controller(
            stub_fetcher(&[("u1", "First"), ("u2", "Second")]),
            stub_transcoder(),
            stub_factory(vec![(0.0, 3.0, "hello")], 1),
        );

        let result = controller.run_json(&payload).await.unwrap();

        assert!(result.success);
        assert_eq!(result.transcripts.len(), 2);
        assert!(result.transcripts.iter().all(|t| t.error.is_none()));
    }

    #[tokio::test]
    async fn test_existing_subtitle_short_circuits_without_recognizer() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Clip");
        fs_err::create_dir_all(&folder).unwrap();
        fs_err::write(folder.join("Clip.mp4"), b"video").unwrap();
        fs_err::write(folder.join("Clip.txt"), b"already transcribed").unwrap();

        let payload = format!(
            r#"{{"urls":["u1"],"output":{:?},"overwrite_subtitle":false}}"#,
            dir.path().to_str().unwrap()
        );
        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_resolve_metadata().returning(|_| {
            Ok(VideoMetadata {
                title: "Clip".to_string(),
                ext: "mp4".to_string(),
            })
        });
        fetcher.expect_download().times(0);
        let mut factory = MockRecognizerFactory::new();
        factory.expect_load().times(0);
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_audio().times(0);

        let controller = controller(fetcher, transcoder, factory);
        let result = controller.run_json(&payload).await.unwrap();

        assert!(result.success);
        let outcome = &result.transcripts[0];
        assert!(outcome.error.is_none());
        assert_eq!(outcome.transcript, Some(folder.join("Clip.txt")));
        // File content untouched.
        assert_eq!(
            fs_err::read_to_string(folder.join("Clip.txt")).unwrap(),
            "already transcribed"
        );
    }

    #[tokio::test]
    async fn test_item_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1","u2"],"output":{:?}}}"#,
            dir.path().to_str().unwrap()
        );

        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_audio().returning(|video_path| {
            if video_path.to_string_lossy().contains("First") {
                Err(anyhow::anyhow!("no audio track"))
            } else {
                let audio_path = video_path.with_extension("wav");
                fs_err::write(&audio_path, b"audio")?;
                Ok(audio_path)
            }
        });

        let controller = controller(
            stub_fetcher(&[("u1", "First"), ("u2", "Second")]),
            transcoder,
            stub_factory(vec![(0.0, 3.0, "ok")], 1),
        );

        let result = controller.run_json(&payload).await.unwrap();

        // The batch still succeeds; the broken item carries the error.
        assert!(result.success);
        assert_eq!(result.transcripts.len(), 2);
        assert!(result.transcripts[0].transcript.is_none());
        assert!(result.transcripts[0]
            .error
            .as_ref()
            .unwrap()
            .contains("no audio track"));
        assert!(result.transcripts[1].transcript.is_some());
        assert!(result.message.contains("1 transcripts"));
    }

    #[tokio::test]
    async fn test_acquisition_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1","bad","u3"],"output":{:?}}}"#,
            dir.path().to_str().unwrap()
        );
        // "bad" is unknown to the stub fetcher, so its resolve fails.
        let controller = controller(
            stub_fetcher(&[("u1", "First"), ("u3", "Third")]),
            stub_transcoder(),
            stub_factory(vec![(0.0, 3.0, "ok")], 1),
        );

        let result = controller.run_json(&payload).await.unwrap();

        assert!(result.success);
        assert_eq!(result.downloaded, vec!["u1".to_string(), "u3".to_string()]);
        assert_eq!(result.transcripts.len(), 2);
        assert!(result.transcripts.iter().all(|t| t.transcript.is_some()));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let payload = format!(
            r#"{{"urls":["u1"],"output":{:?},"overwrite_subtitle":false}}"#,
            dir.path().to_str().unwrap()
        );

        let first = controller(
            stub_fetcher(&[("u1", "Clip")]),
            stub_transcoder(),
            stub_factory(vec![(0.0, 3.0, "hello")], 1),
        );
        let result = first.run_json(&payload).await.unwrap();
        let path = result.transcripts[0].transcript.clone().unwrap();
        let content = fs_err::read_to_string(&path).unwrap();

        // Second run: no download, no model load, same file content.
        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_resolve_metadata().returning(|_| {
            Ok(VideoMetadata {
                title: "Clip".to_string(),
                ext: "mp4".to_string(),
            })
        });
        fetcher.expect_download().times(0);
        let mut factory = MockRecognizerFactory::new();
        factory.expect_load().times(0);
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_audio().times(0);

        let second = controller(fetcher, transcoder, factory);
        let result = second.run_json(&payload).await.unwrap();

        assert!(result.success);
        assert_eq!(result.downloaded, vec!["u1".to_string()]);
        assert!(result.transcripts[0].error.is_none());
        assert_eq!(fs_err::read_to_string(&path).unwrap(), content);
    }
}
