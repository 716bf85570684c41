//! Reading and writing `~/.surveykml/config.ini`.
//!
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

const CONFIG_DIR_NAME: &str = ".surveykml";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but could not be read or is not valid INI
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value that fails validation
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load from `~/.surveykml/config.ini`.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigFileError::Read {
                    path: path.to_path_buf(),
                    source: ini::Error::Io(e),
                })
            }
        };

        let ini = Ini::load_from_str(&text).map_err(|e| ConfigFileError::Read {
            path: path.to_path_buf(),
            source: ini::Error::Parse(e),
        })?;
        super::parser::parse_ini(&ini)
    }

    /// Save to `~/.surveykml/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    ///
    /// Writes a sibling `.tmp` file and renames it over `path`, so a failed
    /// write never leaves a truncated config behind.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_err = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let staged = path.with_extension("ini.tmp");
        fs::write(&staged, super::writer::to_config_string(self)).map_err(write_err)?;
        fs::rename(&staged, path).map_err(write_err)
    }
}

/// The config directory, `~/.surveykml` (or `./.surveykml` without a home).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// The config file, `~/.surveykml/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
