//! Fix records, session states and outcomes.

use std::fmt;

use thiserror::Error;

use crate::geodesy::{GeodeticError, GeographicPoint, GridPoint};

/// One position reading from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    /// WGS84 latitude, degrees
    pub latitude: f64,
    /// WGS84 longitude, degrees
    pub longitude: f64,
    /// Altitude above the ellipsoid, meters (0 if unknown)
    pub altitude: f64,
    /// Horizontal accuracy radius, meters
    pub accuracy: f64,
    /// Name of the provider that produced the reading
    pub provider: String,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, provider: &str) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            accuracy,
            provider: provider.to_string(),
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn geographic(&self) -> GeographicPoint {
        GeographicPoint::new(self.longitude, self.latitude)
    }

    /// Usable readings have finite coordinates and a finite, non-negative
    /// accuracy radius.
    pub fn is_usable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.accuracy.is_finite()
            && self.accuracy >= 0.0
    }
}

/// How a final fix was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixQuality {
    /// A polled reading met the accuracy threshold before the timeout
    Live,
    /// The timeout elapsed; this is the best reading seen
    BestAvailable,
}

impl fmt::Display for FixQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixQuality::Live => write!(f, "live"),
            FixQuality::BestAvailable => write!(f, "best available"),
        }
    }
}

/// Final fix with paired grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyFix {
    pub fix: LocationFix,
    pub grid: GridPoint,
    pub quality: FixQuality,
}

impl SurveyFix {
    /// Map link for the fix.
    pub fn map_url(&self) -> String {
        format!(
            "https://maps.google.com/?q={:.6},{:.6}",
            self.fix.latitude, self.fix.longitude
        )
    }

    /// Plain-text block suitable for sharing.
    pub fn summary(&self) -> String {
        format!(
            "My Location\n\
             WGS84:\n  Lat: {:.6}\n  Lon: {:.6}\n\
             SLD99:\n  North: {:.3} m\n  East: {:.3} m\n\
             Accuracy: ±{:.1} m ({})\n\
             {}",
            self.fix.latitude,
            self.fix.longitude,
            self.grid.northing,
            self.grid.easting,
            self.fix.accuracy,
            self.quality,
            self.map_url()
        )
    }
}

/// Session state as observed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Requesting,
    Polling,
    TimedOut,
    Done,
    Failed,
    Cancelled,
}

impl AcquisitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Polling => "polling",
            Self::TimedOut => "timed out",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Why a session ended without a fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionFailure {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("No location provider is enabled")]
    ProviderUnavailable,

    #[error("No location fix obtained before the timeout")]
    NoFixObtained,

    #[error("Fix could not be converted to grid coordinates: {0}")]
    Transform(#[from] GeodeticError),

    /// The controller task panicked or was aborted
    #[error("Acquisition interrupted: {0}")]
    Interrupted(String),
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    Done(SurveyFix),
    Failed(AcquisitionFailure),
    Cancelled,
}

impl AcquisitionOutcome {
    pub fn state(&self) -> AcquisitionState {
        match self {
            Self::Done(_) => AcquisitionState::Done,
            Self::Failed(_) => AcquisitionState::Failed,
            Self::Cancelled => AcquisitionState::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_fix() -> SurveyFix {
        SurveyFix {
            fix: LocationFix::new(6.9271, 79.8612, 4.5, "gps"),
            grid: GridPoint::new(399_158.593_59, 491_947.315_82),
            quality: FixQuality::Live,
        }
    }

    #[test]
    fn test_summary_formatting() {
        let summary = survey_fix().summary();
        assert!(summary.contains("Lat: 6.927100"));
        assert!(summary.contains("Lon: 79.861200"));
        assert!(summary.contains("North: 491947.316 m"));
        assert!(summary.contains("East: 399158.594 m"));
        assert!(summary.contains("±4.5 m (live)"));
        assert!(summary.ends_with("https://maps.google.com/?q=6.927100,79.861200"));
    }

    #[test]
    fn test_usable_fix() {
        assert!(LocationFix::new(7.0, 80.0, 10.0, "gps").is_usable());
        assert!(!LocationFix::new(f64::NAN, 80.0, 10.0, "gps").is_usable());
        assert!(!LocationFix::new(7.0, 80.0, -1.0, "gps").is_usable());
        assert!(!LocationFix::new(7.0, 80.0, f64::INFINITY, "gps").is_usable());
    }

    #[test]
    fn test_terminal_states() {
        assert!(AcquisitionState::Done.is_terminal());
        assert!(AcquisitionState::Cancelled.is_terminal());
        assert!(!AcquisitionState::TimedOut.is_terminal());
        assert!(!AcquisitionState::Polling.is_terminal());
    }

    #[test]
    fn test_outcome_state() {
        assert_eq!(
            AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained).state(),
            AcquisitionState::Failed
        );
        assert_eq!(
            AcquisitionOutcome::Done(survey_fix()).state(),
            AcquisitionState::Done
        );
    }
}
