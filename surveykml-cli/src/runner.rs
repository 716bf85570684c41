//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging for the commands that do
//! real work (`layers`, `convert`, `locate`).

use std::path::Path;
use std::sync::Arc;

use surveykml::config::ConfigFile;
use surveykml::convert::ConversionPipeline;
use surveykml::geodesy::GeodeticTransform;
use surveykml::log::TracingLogger;
use surveykml::logging::{init_logging_at, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that owns the loaded configuration and the logging guard.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration (from `config_path` or the default location) and
    /// start logging to the configured file.
    ///
    /// Log events are mirrored to stdout only in debug mode; otherwise
    /// stdout is reserved for command output.
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging_at(&config.logging.file, debug, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SurveyKML v{}", surveykml::VERSION);
        info!("SurveyKML CLI: {} command", command);
    }

    /// Conversion pipeline reporting through `tracing`.
    pub fn pipeline(&self, document_name: Option<String>) -> ConversionPipeline {
        let name = document_name.unwrap_or_else(|| self.config.conversion.document_name.clone());
        ConversionPipeline::new(
            GeodeticTransform::sld99(),
            Arc::new(TracingLogger::new("convert")),
        )
        .with_document_name(name)
    }
}

/// Load configuration without touching logging.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    })
}
