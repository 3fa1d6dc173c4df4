use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fetch::{DownloadOptions, MediaFetcher};
use crate::progress::ProgressSink;
use crate::subtitle::SubtitleFormat;
use crate::utils::sanitize_title;
use crate::Result;

/// A video materialized on disk, queued for transcription
#[derive(Debug, Clone)]
pub struct AcquiredItem {
    /// Title reported by the source
    pub title: String,

    /// URL the item was requested under
    pub url: String,

    /// Local path of the merged video file
    pub video_path: PathBuf,

    /// Per-video folder the media and subtitles live in
    pub folder: PathBuf,
}

/// Outcome of the acquisition phase
#[derive(Debug, Default)]
pub struct AcquisitionReport {
    /// Items ready for transcription, in request order
    pub items: Vec<AcquiredItem>,

    /// URLs that were materialized, including already-present skips
    pub downloaded: Vec<String>,
}

/// Resolve and materialize every URL, in request order. Media already on disk
/// is skipped but still enqueued and counted as downloaded. A failing URL is
/// logged and dropped; it never aborts the rest of the batch.
pub async fn acquire(
    fetcher: &dyn MediaFetcher,
    urls: &[String],
    output_dir: &Path,
    source_subtitles: Option<SubtitleFormat>,
    sink: &(dyn ProgressSink + 'static),
) -> AcquisitionReport {
    let mut report = AcquisitionReport::default();
    // Folder names claimed in this batch, keyed by name, valued by the title
    // that owns them.
    let mut claimed: HashMap<String, String> = HashMap::new();

    for url in urls {
        match acquire_one(fetcher, url, output_dir, source_subtitles, sink, &mut claimed).await {
            Ok(item) => {
                tracing::info!("[{}] queued for transcription", item.title);
                report.downloaded.push(url.clone());
                report.items.push(item);
            }
            Err(err) => {
                tracing::warn!("acquisition failed for {}: {:#}", url, err);
            }
        }
    }

    report
}

async fn acquire_one(
    fetcher: &dyn MediaFetcher,
    url: &str,
    output_dir: &Path,
    source_subtitles: Option<SubtitleFormat>,
    sink: &(dyn ProgressSink + 'static),
    claimed: &mut HashMap<String, String>,
) -> Result<AcquiredItem> {
    let metadata = fetcher.resolve_metadata(url).await?;

    let folder_name = claim_folder_name(&metadata.title, claimed);
    let folder = output_dir.join(&folder_name);
    fs_err::create_dir_all(&folder)?;

    // The media file is named after the folder, so presence on disk is
    // checkable before any download starts.
    let expected_path = folder.join(format!("{}.{}", folder_name, metadata.ext));
    if expected_path.exists() {
        tracing::info!("[{}] media already present, skipping download", metadata.title);
        return Ok(AcquiredItem {
            title: metadata.title,
            url: url.to_string(),
            video_path: expected_path,
            folder,
        });
    }

    let options = DownloadOptions {
        title: metadata.title.clone(),
        file_stem: folder_name,
        source_subtitles,
    };
    let video_path = fetcher.download(url, &folder, &options, sink).await?;

    Ok(AcquiredItem {
        title: metadata.title,
        url: url.to_string(),
        video_path,
        folder,
    })
}

/// Sanitized folder name for a title. Distinct titles that sanitize to the
/// same name within one batch get a numeric suffix instead of silently
/// sharing a folder; the same title always reuses its claim.
fn claim_folder_name(title: &str, claimed: &mut HashMap<String, String>) -> String {
    let base = {
        let sanitized = sanitize_title(title);
        if sanitized.is_empty() {
            "video".to_string()
        } else {
            sanitized
        }
    };

    let mut candidate = base.clone();
    let mut suffix = 1;
    loop {
        match claimed.get(&candidate) {
            None => {
                claimed.insert(candidate.clone(), title.to_string());
                return candidate;
            }
            Some(owner) if owner == title => return candidate,
            Some(_) => {
                suffix += 1;
                candidate = format!("{} ({})", base, suffix);
            }
        }
    }
}
