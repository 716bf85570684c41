//! Configuration key access and validation.
//!
//! Type-safe getting and setting of configuration values by key name.
//! Values are validated with the same rules the INI parser applies.

use std::str::FromStr;
use thiserror::Error;

use super::parser::{expand_tilde, optional_path, parse_meters, parse_positive_secs};
use super::settings::{CollisionPolicy, ConfigFile};
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Conversion settings
    ConversionDocumentName,
    ConversionOutputDir,
    ConversionOnCollision,

    // Location settings
    LocationTimeoutSecs,
    LocationPollIntervalSecs,
    LocationHysteresisM,
    LocationGoodEnoughM,
    LocationReplayFile,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "location.timeout_secs").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ConversionDocumentName => "conversion.document_name",
            ConfigKey::ConversionOutputDir => "conversion.output_dir",
            ConfigKey::ConversionOnCollision => "conversion.on_collision",
            ConfigKey::LocationTimeoutSecs => "location.timeout_secs",
            ConfigKey::LocationPollIntervalSecs => "location.poll_interval_secs",
            ConfigKey::LocationHysteresisM => "location.hysteresis_m",
            ConfigKey::LocationGoodEnoughM => "location.good_enough_m",
            ConfigKey::LocationReplayFile => "location.replay_file",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "location").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "timeout_secs").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ConversionDocumentName => config.conversion.document_name.clone(),
            ConfigKey::ConversionOutputDir => config
                .conversion
                .output_dir
                .as_deref()
                .map(path_to_string)
                .unwrap_or_default(),
            ConfigKey::ConversionOnCollision => config.conversion.on_collision.to_string(),
            ConfigKey::LocationTimeoutSecs => config.location.timeout_secs.to_string(),
            ConfigKey::LocationPollIntervalSecs => config.location.poll_interval_secs.to_string(),
            ConfigKey::LocationHysteresisM => config.location.hysteresis_m.to_string(),
            ConfigKey::LocationGoodEnoughM => config.location.good_enough_m.to_string(),
            ConfigKey::LocationReplayFile => config
                .location
                .replay_file
                .as_deref()
                .map(path_to_string)
                .unwrap_or_default(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Validate and set a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let fail = |reason: String| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason,
        };

        match self {
            ConfigKey::ConversionDocumentName => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(fail("must not be empty".to_string()));
                }
                config.conversion.document_name = value.to_string();
            }
            ConfigKey::ConversionOutputDir => {
                config.conversion.output_dir = optional_path(value);
            }
            ConfigKey::ConversionOnCollision => {
                config.conversion.on_collision = value.parse::<CollisionPolicy>().map_err(fail)?;
            }
            ConfigKey::LocationTimeoutSecs => {
                config.location.timeout_secs = parse_positive_secs(value).map_err(fail)?;
            }
            ConfigKey::LocationPollIntervalSecs => {
                config.location.poll_interval_secs = parse_positive_secs(value).map_err(fail)?;
            }
            ConfigKey::LocationHysteresisM => {
                config.location.hysteresis_m = parse_meters(value, false).map_err(fail)?;
            }
            ConfigKey::LocationGoodEnoughM => {
                config.location.good_enough_m = parse_meters(value, true).map_err(fail)?;
            }
            ConfigKey::LocationReplayFile => {
                config.location.replay_file = optional_path(value);
            }
            ConfigKey::LoggingFile => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(fail("must be a valid path".to_string()));
                }
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ConversionDocumentName,
            ConfigKey::ConversionOutputDir,
            ConfigKey::ConversionOnCollision,
            ConfigKey::LocationTimeoutSecs,
            ConfigKey::LocationPollIntervalSecs,
            ConfigKey::LocationHysteresisM,
            ConfigKey::LocationGoodEnoughM,
            ConfigKey::LocationReplayFile,
            ConfigKey::LoggingFile,
        ]
    }
}
