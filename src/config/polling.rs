//! Poll cadence and explorer settings

use serde::Deserialize;
use std::time::Duration;

/// Poll intervals
#[derive(Debug, Clone, PartialEq)]
pub struct PollingConfig {
    /// Session status poll period
    pub status_interval_secs: u64,
    /// Upper bound on the readings refresh period
    pub readings_max_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 5,
            readings_max_interval_secs: 5,
        }
    }
}

/// Poll intervals as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FilePolling {
    pub status_interval_secs: Option<u64>,
    pub readings_max_interval_secs: Option<u64>,
}

impl PollingConfig {
    /// Create from file config with defaults. Zero intervals fall back.
    pub fn from_file(file: Option<FilePolling>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            status_interval_secs: file
                .status_interval_secs
                .filter(|s| *s > 0)
                .unwrap_or(defaults.status_interval_secs),
            readings_max_interval_secs: file
                .readings_max_interval_secs
                .filter(|s| *s > 0)
                .unwrap_or(defaults.readings_max_interval_secs),
        }
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn readings_max_interval(&self) -> Duration {
        Duration::from_secs(self.readings_max_interval_secs)
    }
}

/// File explorer settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreConfig {
    /// Show loaded frames again on Back instead of re-fetching them
    pub cache_frames: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self { cache_frames: true }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileExplore {
    pub cache_frames: Option<bool>,
}

impl ExploreConfig {
    pub fn from_file(file: Option<FileExplore>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            cache_frames: file.cache_frames.unwrap_or(true),
        }
    }
}
