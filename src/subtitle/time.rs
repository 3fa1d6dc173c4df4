//! Fixed-width subtitle timestamp formatting.

/// Format a seconds offset as an SRT timestamp, `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_seconds(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format a seconds offset as a WebVTT timestamp, `HH:MM:SS.mmm`
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_seconds(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

fn split_seconds(seconds: f64) -> (u64, u64, u64, u64) {
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    // Milliseconds are truncated, matching subtitle timestamp granularity.
    let millis = ((seconds % 1.0) * 1000.0) as u64;
    (hours, minutes, secs, millis)
}
