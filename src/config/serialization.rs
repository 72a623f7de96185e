//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# eldash configuration

# Logger service address (ELDASH_URL overrides)
base_url = "{base_url}"

# Timeout for each request to the service, in seconds
request_timeout_secs = {timeout}

# Poll cadence, in seconds
[polling]
status_interval_secs = {status_interval}
# Readings follow the logger's LOG_INTERVAL but never refresh slower than this
readings_max_interval_secs = {readings_max}

# File explorer
[explore]
# Show loaded views again on Back instead of re-fetching them
cache_frames = {cache_frames}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# File logging (in addition to TUI buffer or stderr)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly or daily
file_prefix = "{log_file_prefix}"
"#,
            base_url = self.base_url,
            timeout = self.request_timeout_secs,
            status_interval = self.polling.status_interval_secs,
            readings_max = self.polling.readings_max_interval_secs,
            cache_frames = self.explore.cache_frames,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display().to_string().replace('\\', "/"),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}
