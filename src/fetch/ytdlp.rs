//! yt-dlp backed media fetcher.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::{DownloadOptions, MediaFetcher, VideoMetadata, SUBTITLE_LANGUAGES};
use crate::progress::{DownloadPhase, DownloadProgress, ProgressSink};
use crate::{PipelineError, Result};

/// Progress template handed to yt-dlp; each line arrives as
/// `<status> <downloaded> <total> <speed>` with `NA` for unknown fields.
const PROGRESS_TEMPLATE: &str = "download:%(progress.status)s %(progress.downloaded_bytes)s \
%(progress.total_bytes,progress.total_bytes_estimate)s %(progress.speed)s";

/// Fetcher for platform URLs handled by yt-dlp
pub struct YtDlpFetcher {
    binary: String,
}

impl YtDlpFetcher {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata> {
        tracing::debug!("resolving metadata for: {}", url);

        let output = Command::new(&self.binary)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .context("Failed to parse yt-dlp metadata")?;

        let title = info["title"].as_str().unwrap_or("video").to_string();
        let ext = info["ext"].as_str().unwrap_or("mp4").to_string();

        Ok(VideoMetadata { title, ext })
    }

    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &DownloadOptions,
        sink: &(dyn ProgressSink + 'static),
    ) -> Result<PathBuf> {
        let template = dest_dir.join(format!("{}.%(ext)s", options.file_stem));

        let mut command = Command::new(&self.binary);
        command
            .args([
                "--format",
                "bestvideo+bestaudio/best",
                "--no-playlist",
                "--newline",
                "--progress-template",
                PROGRESS_TEMPLATE,
                "--print",
                "after_move:filepath",
                "--no-simulate",
                "-o",
            ])
            .arg(&template);

        if let Some(format) = options.source_subtitles {
            command.args([
                "--write-subs",
                "--sub-langs",
                &SUBTITLE_LANGUAGES.join(","),
                "--sub-format",
                format.as_str(),
            ]);
        }

        command.arg(url);

        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary))?;

        let stdout = child
            .stdout
            .take()
            .context("yt-dlp stdout was not captured")?;
        let mut stderr = child
            .stderr
            .take()
            .context("yt-dlp stderr was not captured")?;

        // Drain stderr concurrently so a chatty process cannot block on a
        // full pipe while we read progress lines.
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            let _ = stderr.read_to_string(&mut buffer).await;
            buffer
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut final_path: Option<PathBuf> = None;
        while let Some(line) = lines.next_line().await? {
            if let Some(progress) = parse_progress_line(&line, &options.title) {
                sink.on_download_progress(&progress);
            } else if !line.trim().is_empty() {
                // The only non-progress stdout line is the printed filepath.
                final_path = Some(PathBuf::from(line.trim()));
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: stderr_output.trim().to_string(),
            }
            .into());
        }

        final_path.ok_or_else(|| {
            PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: "yt-dlp did not report an output file".to_string(),
            }
            .into()
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Parse one progress-template line into a progress event. Returns `None`
/// for lines that are not progress output.
fn parse_progress_line(line: &str, title: &str) -> Option<DownloadProgress> {
    let mut parts = line.split_whitespace();
    let phase = match parts.next()? {
        "downloading" => DownloadPhase::Downloading,
        "finished" => DownloadPhase::Finished,
        _ => return None,
    };

    let bytes_done = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
    let bytes_total = parts.next().and_then(|v| v.parse().ok());
    let bytes_per_second = parts.next().and_then(|v| v.parse().ok());

    Some(DownloadProgress {
        title: title.to_string(),
        bytes_done,
        bytes_total,
        bytes_per_second,
        phase,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_downloading_line() {
        let progress = parse_progress_line("downloading 1048576 4194304 524288.5", "Clip").unwrap();
        assert_eq!(progress.phase, DownloadPhase::Downloading);
        assert_eq!(progress.title, "Clip");
        assert_eq!(progress.bytes_done, 1048576);
        assert_eq!(progress.bytes_total, Some(4194304));
        assert_eq!(progress.bytes_per_second, Some(524288.5));
    }

    #[test]
    fn test_parse_line_with_unknown_fields() {
        let progress = parse_progress_line("downloading 2048 NA NA", "Clip").unwrap();
        assert_eq!(progress.bytes_done, 2048);
        assert_eq!(progress.bytes_total, None);
        assert_eq!(progress.bytes_per_second, None);
    }

    #[test]
    fn test_parse_finished_line() {
        let progress = parse_progress_line("finished 4194304 4194304 NA", "Clip").unwrap();
        assert_eq!(progress.phase, DownloadPhase::Finished);
        assert_eq!(progress.bytes_done, 4194304);
    }

    #[test]
    fn test_non_progress_lines_are_ignored() {
        assert!(parse_progress_line("/downloads/Clip/Clip.mp4", "Clip").is_none());
        assert!(parse_progress_line("", "Clip").is_none());
    }
}
