use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_DICTIONARY: &str = "dict/cj-dict.bin";

/// `debug|info|warn|error`, case-insensitive; anything else is `info`.
pub fn log_level(raw: &str) -> Level {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Blank values fall back to the default artifact path.
pub fn dictionary_path(raw: Option<&str>) -> PathBuf {
    match raw.map(str::trim) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_DICTIONARY),
    }
}

/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
