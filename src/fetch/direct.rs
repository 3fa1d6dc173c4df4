//! Direct media URL fetcher.

use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use url::Url;

use super::{DownloadOptions, MediaFetcher, VideoMetadata};
use crate::progress::{DownloadPhase, DownloadProgress, ProgressSink};
use crate::{PipelineError, Result};

const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "webm", "m4v", "flv", "ts",
];

/// Fetcher for URLs that point straight at a video file
pub struct DirectFetcher {
    client: Client,
}

impl DirectFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Last path segment of the URL, if any
    fn filename_of(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed
            .path_segments()?
            .last()
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_string())
    }

    fn extension_of(url: &str) -> Option<String> {
        let filename = Self::filename_of(url)?;
        Path::new(&filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

impl Default for DirectFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for DirectFetcher {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let filename =
            Self::filename_of(url).with_context(|| format!("URL has no file name: {}", url))?;

        let stem = match filename.rfind('.') {
            Some(dot) => &filename[..dot],
            None => filename.as_str(),
        };
        let title = urlencoding::decode(stem)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| stem.to_string())
            .replace(['_', '-'], " ");

        let ext = Self::extension_of(url).unwrap_or_else(|| "mp4".to_string());

        Ok(VideoMetadata { title, ext })
    }

    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &DownloadOptions,
        sink: &(dyn ProgressSink + 'static),
    ) -> Result<PathBuf> {
        let ext = Self::extension_of(url).unwrap_or_else(|| "mp4".to_string());
        let dest_path = dest_dir.join(format!("{}.{}", options.file_stem, ext));

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        let bytes_total = response.content_length();
        let mut file = fs_err::File::create(&dest_path)?;
        let mut stream = response.bytes_stream();
        let mut bytes_done = 0u64;
        let started = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            bytes_done += chunk.len() as u64;

            let elapsed = started.elapsed().as_secs_f64();
            sink.on_download_progress(&DownloadProgress {
                title: options.title.clone(),
                bytes_done,
                bytes_total,
                bytes_per_second: (elapsed > 0.0).then(|| bytes_done as f64 / elapsed),
                phase: DownloadPhase::Downloading,
            });
        }

        sink.on_download_progress(&DownloadProgress {
            title: options.title.clone(),
            bytes_done,
            bytes_total,
            bytes_per_second: None,
            phase: DownloadPhase::Finished,
        });

        Ok(dest_path)
    }

    fn supports_url(&self, url: &str) -> bool {
        if Url::parse(url).map(|u| !matches!(u.scheme(), "http" | "https")).unwrap_or(true) {
            return false;
        }
        Self::extension_of(url)
            .map(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
