use crate::config::ToolsConfig;

/// Reduce a video title to a filesystem-safe name: alphanumeric characters,
/// spaces, hyphens and underscores survive, everything else is dropped.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Format byte counts in human-readable form
pub fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const KB: f64 = 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a transfer rate for the progress stream
pub fn format_speed(bytes_per_second: Option<f64>) -> String {
    match bytes_per_second {
        Some(speed) if speed > 0.0 => format!("{:.2} MB/s", speed / (1024.0 * 1024.0)),
        _ => "N/A".to_string(),
    }
}

/// Check if the current environment has the required external tools
pub async fn check_dependencies(tools: &ToolsConfig) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&tools.yt_dlp).await {
        missing.push(format!("{} - required for video downloads", tools.yt_dlp));
    }

    if !check_command_available(&tools.ffmpeg).await {
        missing.push(format!("{} - required for audio extraction", tools.ffmpeg));
    }

    if !check_command_available(&tools.whisper).await {
        missing.push(format!("{} - required for transcription", tools.whisper));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title_drops_punctuation() {
        assert_eq!(sanitize_title("Hello, World!"), "Hello World");
        assert_eq!(sanitize_title("a/b\\c:d*e?f"), "abcdef");
        assert_eq!(sanitize_title("snake_case-title 42"), "snake_case-title 42");
    }

    #[test]
    fn test_sanitize_title_trims_whitespace() {
        assert_eq!(sanitize_title("  spaced  "), "spaced");
        assert_eq!(sanitize_title("!!!"), "");
    }

    #[test]
    fn test_sanitize_title_keeps_unicode_letters() {
        assert_eq!(sanitize_title("日本語 タイトル"), "日本語 タイトル");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(None), "N/A");
        assert_eq!(format_speed(Some(0.0)), "N/A");
        assert_eq!(format_speed(Some(1024.0 * 1024.0 * 1.5)), "1.50 MB/s");
    }
}
