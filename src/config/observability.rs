//! `[logging]` section

use serde::Deserialize;
use std::path::PathBuf;

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
}

impl LogRotation {
    /// Anything but "hourly" rolls daily
    pub fn from_str(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("hourly") {
            Self::Hourly
        } else {
            Self::Daily
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter level for this crate when RUST_LOG is unset
    pub level: String,
    /// Also write JSON lines to a rolling file
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// The appender adds the date: `eldash.2024-01-15`
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: default_log_dir(),
            file_rotation: LogRotation::Daily,
            file_prefix: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Under the platform's local data dir; relative `logs` without one
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let Some(file) = file else {
            return Self::default();
        };
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file.file_dir.map_or(defaults.file_dir, PathBuf::from),
            file_rotation: file
                .file_rotation
                .as_deref()
                .map_or(defaults.file_rotation, LogRotation::from_str),
            file_prefix: file
                .file_prefix
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.file_prefix),
        }
    }
}
