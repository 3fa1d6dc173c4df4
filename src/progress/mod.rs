use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::utils::{format_size, format_speed};

/// Download lifecycle as reported by the media fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Downloading,
    Finished,
}

/// Byte-level state of one in-flight download
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Title of the video being downloaded
    pub title: String,

    /// Bytes written so far
    pub bytes_done: u64,

    /// Total size, when the source reports one
    pub bytes_total: Option<u64>,

    /// Instantaneous transfer rate in bytes per second
    pub bytes_per_second: Option<f64>,

    pub phase: DownloadPhase,
}

/// Recognized-seconds progress for one transcription
#[derive(Debug, Clone, Copy)]
pub struct TranscribeProgress {
    /// Seconds of audio recognized so far
    pub recognized_seconds: f64,

    /// Duration estimate for the whole audio file
    pub total_seconds: f64,
}

/// Observability sink for the pipeline's progress stream.
///
/// Injected into the controller and the fetchers so none of them own console
/// state; events arrive strictly sequentially (one download or transcription
/// at a time).
pub trait ProgressSink: Send + Sync {
    fn on_download_progress(&self, progress: &DownloadProgress);

    fn on_transcribe_progress(&self, progress: &TranscribeProgress);

    /// Called once the recognizer's segment stream is fully drained
    fn on_transcribe_finished(&self);
}

/// Sink that renders in-place console progress bars
pub struct ConsoleProgress {
    // At most one bar is live at a time; the pipeline is sequential.
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_download_progress(&self, progress: &DownloadProgress) {
        let mut slot = self.bar.lock().unwrap();
        match progress.phase {
            DownloadPhase::Downloading => {
                let bar = slot.get_or_insert_with(|| match progress.bytes_total {
                    Some(total) => {
                        let bar = ProgressBar::new(total);
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template("{spinner:.green} [{msg}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                                .unwrap(),
                        );
                        bar
                    }
                    None => {
                        let bar = ProgressBar::new_spinner();
                        bar.set_style(
                            ProgressStyle::default_spinner()
                                .template("{spinner:.green} {msg}")
                                .unwrap(),
                        );
                        bar
                    }
                });
                if progress.bytes_total.is_some() {
                    bar.set_message(progress.title.clone());
                    bar.set_position(progress.bytes_done);
                } else {
                    bar.set_message(format!(
                        "[{}] {} | {}",
                        progress.title,
                        format_size(progress.bytes_done),
                        format_speed(progress.bytes_per_second)
                    ));
                    bar.tick();
                }
            }
            DownloadPhase::Finished => {
                if let Some(bar) = slot.take() {
                    bar.finish_with_message(format!(
                        "[{}] download complete ({})",
                        progress.title,
                        format_size(progress.bytes_done)
                    ));
                }
            }
        }
    }

    fn on_transcribe_progress(&self, progress: &TranscribeProgress) {
        let mut slot = self.bar.lock().unwrap();
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(progress.total_seconds.ceil() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} Transcribing [{bar:40.cyan/blue}] {pos}s/{len}s")
                    .unwrap(),
            );
            bar
        });
        bar.set_position(progress.recognized_seconds as u64);
    }

    fn on_transcribe_finished(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_with_message("Transcription complete");
        }
    }
}

/// Sink that ignores every event, for quiet mode and tests
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_download_progress(&self, _progress: &DownloadProgress) {}

    fn on_transcribe_progress(&self, _progress: &TranscribeProgress) {}

    fn on_transcribe_finished(&self) {}
}
