use clap::Parser;

#[derive(Parser)]
#[command(
    name = "video-scribe",
    about = "Download videos and produce time-aligned subtitle transcripts",
    version,
    long_about = "Downloads a batch of remote videos, extracts their audio, transcribes the \
speech and writes subtitle files next to each video. The whole batch is described by a single \
JSON request payload."
)]
#[command(after_help = "\
Request fields:
  urls                video URL list (required)
  output              download directory (default: \"./downloads\")
  model               recognizer model name (default: \"small\", e.g. tiny/base/small/medium/large-v3)
  transcribe          whether to transcribe after downloading (default: true)
  subtitle_format     txt, srt, vtt or json (default: \"txt\")
  download_subtitle   also fetch source-provided subtitles (default: false)
  overwrite_subtitle  overwrite existing subtitle files (default: true)

Examples:
  video-scribe '{\"urls\":[\"URL\"],\"output\":\"./downloads\"}'
  video-scribe '{\"urls\":[\"URL\"],\"transcribe\":false}'
  video-scribe '{\"urls\":[\"URL\"],\"subtitle_format\":\"srt\"}'
  video-scribe '{\"urls\":[\"URL\"],\"download_subtitle\":true}'
  video-scribe '{\"urls\":[\"URL\"],\"overwrite_subtitle\":false}'")]
pub struct Cli {
    /// JSON batch request payload (see the field list below)
    #[arg(value_name = "REQUEST")]
    pub request: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
