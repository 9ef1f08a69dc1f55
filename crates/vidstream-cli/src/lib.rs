use vidstream_core::models::UploadProgress;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Status line shown while an upload is running.
pub fn progress_line(file_name: &str, progress: &UploadProgress) -> String {
    format!(
        "{} [{:>3}%] {}",
        truncate_string(file_name, 40),
        progress.percent,
        progress.status
    )
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
///
/// `log_format` "json" switches to JSON lines; anything else is plain text.
pub fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
