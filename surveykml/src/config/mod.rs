//! User configuration.
//!
//! Settings are read from `~/.surveykml/config.ini`. Missing files and
//! missing keys fall back to defaults; present keys are validated.
//!
//! # Example
//!
//! ```
//! use surveykml::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::LocationTimeoutSecs.set(&mut config, "30").unwrap();
//!
//! let settings = config.location.acquisition_settings();
//! assert_eq!(settings.timeout.as_secs(), 30);
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_log_file, DEFAULT_COLLISION_POLICY, DEFAULT_LOCATION_TIMEOUT_SECS,
    DEFAULT_LOG_FILE_NAME, DEFAULT_POLL_INTERVAL_SECS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    CollisionPolicy, ConfigFile, ConversionSettings, LocationSettings, LoggingSettings,
};
