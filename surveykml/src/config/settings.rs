//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::convert::CollisionDecision;
use crate::location::AcquisitionSettings;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// DXF to KML conversion settings
    pub conversion: ConversionSettings,
    /// Location acquisition settings
    pub location: LocationSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Prompt interactively
    Ask,
    Overwrite,
    Rename,
    Cancel,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Overwrite => "overwrite",
            Self::Rename => "rename",
            Self::Cancel => "cancel",
        }
    }

    /// The decision to apply without asking, or `None` for [`CollisionPolicy::Ask`].
    pub fn decision(&self) -> Option<CollisionDecision> {
        match self {
            Self::Ask => None,
            Self::Overwrite => Some(CollisionDecision::Overwrite),
            Self::Rename => Some(CollisionDecision::AutoRename),
            Self::Cancel => Some(CollisionDecision::Cancel),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "overwrite" => Ok(Self::Overwrite),
            "rename" => Ok(Self::Rename),
            "cancel" => Ok(Self::Cancel),
            _ => Err("must be one of: ask, overwrite, rename, cancel".to_string()),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSettings {
    /// `<name>` of the generated KML document
    pub document_name: String,
    /// Output directory; `None` writes next to the source drawing
    pub output_dir: Option<PathBuf>,
    /// Collision handling used when no flag is given
    pub on_collision: CollisionPolicy,
}

/// Location acquisition configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    /// Overall session timeout in seconds
    pub timeout_secs: u64,
    /// Seconds between provider polls
    pub poll_interval_secs: u64,
    /// Required accuracy improvement (meters) before a new reading replaces the best
    pub hysteresis_m: f64,
    /// Accuracy (meters) at which a polled reading ends the session early
    pub good_enough_m: f64,
    /// CSV of scripted fixes for the replay backend
    pub replay_file: Option<PathBuf>,
}

impl LocationSettings {
    /// Session settings for these values, other knobs left at their defaults.
    pub fn acquisition_settings(&self) -> AcquisitionSettings {
        AcquisitionSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            hysteresis_margin: self.hysteresis_m,
            good_enough: self.good_enough_m,
            ..AcquisitionSettings::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
