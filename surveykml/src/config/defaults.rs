//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::convert::DEFAULT_DOCUMENT_NAME;
use crate::location::{DEFAULT_GOOD_ENOUGH_M, DEFAULT_HYSTERESIS_M, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Default collision handling.
pub const DEFAULT_COLLISION_POLICY: CollisionPolicy = CollisionPolicy::Ask;

/// Default session timeout in seconds.
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = DEFAULT_POLL_INTERVAL.as_secs();

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "surveykml.log";

/// Default log file path (~/.surveykml/surveykml.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            output_dir: None,
            on_collision: DEFAULT_COLLISION_POLICY,
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_LOCATION_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            hysteresis_m: DEFAULT_HYSTERESIS_M,
            good_enough_m: DEFAULT_GOOD_ENOUGH_M,
            replay_file: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            conversion: ConversionSettings::default(),
            location: LocationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
