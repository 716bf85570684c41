//! CLI error handling with user-friendly messages.
//!
//! Every command returns `Result<(), CliError>`; `main` prints the error and
//! exits through [`CliError::exit`].

use std::fmt;
use std::process;

use surveykml::config::ConfigFileError;
use surveykml::convert::PipelineError;
use surveykml::drawing::DrawingError;
use surveykml::geodesy::GeodeticError;
use surveykml::location::{AcquisitionFailure, ReplayError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Bad command line input (unknown layer, color, ...)
    Input(String),
    /// Drawing could not be read
    Drawing(DrawingError),
    /// Conversion failed
    Conversion(PipelineError),
    /// Coordinate outside the supported area
    Transform(GeodeticError),
    /// Replay file could not be loaded
    Replay(ReplayError),
    /// No positioning backend configured
    NoBackend,
    /// Location acquisition ended without a fix
    Location(AcquisitionFailure),
    /// Interactive prompt failed or was needed without a terminal
    Prompt(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Conversion(PipelineError::EmptyResult { .. }) => {
                eprintln!();
                eprintln!("Nothing was converted. Check that:");
                eprintln!("  1. At least one layer is selected (see 'surveykml layers <file>')");
                eprintln!("  2. The drawing uses SLD99 grid coordinates in meters");
            }
            CliError::NoBackend => {
                eprintln!();
                eprintln!("Record fixes as CSV (provider,lat,lon,alt,accuracy) and either:");
                eprintln!("  1. Pass --replay <file>");
                eprintln!("  2. Run 'surveykml config set location.replay_file <file>'");
            }
            CliError::Location(AcquisitionFailure::PermissionDenied) => {
                eprintln!();
                eprintln!("Grant location access to this program and try again.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input(msg) => write!(f, "{}", msg),
            CliError::Drawing(e) => write!(f, "{}", e),
            CliError::Conversion(e) => write!(f, "Conversion failed: {}", e),
            CliError::Transform(e) => write!(f, "Cannot transform coordinate: {}", e),
            CliError::Replay(e) => write!(f, "{}", e),
            CliError::NoBackend => write!(f, "No positioning backend is available"),
            CliError::Location(e) => write!(f, "Location unavailable: {}", e),
            CliError::Prompt(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Drawing(e) => Some(e),
            CliError::Conversion(e) => Some(e),
            CliError::Transform(e) => Some(e),
            CliError::Replay(e) => Some(e),
            CliError::Location(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<DrawingError> for CliError {
    fn from(e: DrawingError) -> Self {
        CliError::Drawing(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Conversion(e)
    }
}

impl From<GeodeticError> for CliError {
    fn from(e: GeodeticError) -> Self {
        CliError::Transform(e)
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Replay(e)
    }
}
