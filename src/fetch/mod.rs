use anyhow::anyhow;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::progress::ProgressSink;
use crate::subtitle::SubtitleFormat;
use crate::Result;

pub mod direct;
pub mod ytdlp;

pub use direct::DirectFetcher;
pub use ytdlp::YtDlpFetcher;

/// Languages requested when fetching source-provided subtitles, in
/// preference order.
pub const SUBTITLE_LANGUAGES: [&str; 6] = ["zh-Hans", "zh-CN", "zh-TW", "en", "ja", "all"];

/// Metadata resolved for a remote video without downloading it
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// Video title as reported by the source
    pub title: String,

    /// Container extension the fetcher will produce
    pub ext: String,
}

/// Per-item download context, passed explicitly into the fetch call instead
/// of being captured by a progress closure.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Display title used in progress events
    pub title: String,

    /// Base name (no extension) the media file is written under
    pub file_stem: String,

    /// Also fetch source-provided subtitles in this format
    pub source_subtitles: Option<SubtitleFormat>,
}

/// Media acquisition capability for one class of URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve title and container extension without downloading
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Download the merged video into `dest_dir` as
    /// `<file_stem>.<ext>`, reporting byte progress to `sink`.
    /// Returns the local path of the produced file.
    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &DownloadOptions,
        sink: &(dyn ProgressSink + 'static),
    ) -> Result<PathBuf>;

    /// Check if this fetcher supports the given URL
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this fetcher
    fn name(&self) -> &'static str;
}

/// Dispatches each URL to the first fetcher that supports it
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn MediaFetcher>>,
}

impl FetcherRegistry {
    /// Registry with the default fetchers: direct media links first, yt-dlp
    /// for everything else.
    pub fn with_defaults(config: &Config) -> Self {
        Self {
            fetchers: vec![
                Box::new(DirectFetcher::new()),
                Box::new(YtDlpFetcher::new(&config.tools.yt_dlp)),
            ],
        }
    }

    pub fn with_fetchers(fetchers: Vec<Box<dyn MediaFetcher>>) -> Self {
        Self { fetchers }
    }

    fn find(&self, url: &str) -> Result<&dyn MediaFetcher> {
        self.fetchers
            .iter()
            .find(|fetcher| fetcher.supports_url(url))
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| anyhow!("No fetcher supports URL: {}", url))
    }
}

#[async_trait]
impl MediaFetcher for FetcherRegistry {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let fetcher = self.find(url)?;
        tracing::debug!("resolving {} via {}", url, fetcher.name());
        fetcher.resolve_metadata(url).await
    }

    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &DownloadOptions,
        sink: &(dyn ProgressSink + 'static),
    ) -> Result<PathBuf> {
        self.find(url)?.download(url, dest_dir, options, sink).await
    }

    fn supports_url(&self, url: &str) -> bool {
        self.fetchers.iter().any(|fetcher| fetcher.supports_url(url))
    }

    fn name(&self) -> &'static str {
        "registry"
    }
}
