//! Location provider interfaces.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::state::LocationFix;

/// Kind of positioning source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Satellite receiver
    Gps,
    /// Cell/Wi-Fi based
    Network,
    /// Readings cached from other consumers; only read at session start
    Passive,
}

impl ProviderKind {
    /// Whether the sampling actor queries this kind every poll.
    pub fn is_pollable(&self) -> bool {
        !matches!(self, ProviderKind::Passive)
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gps" => Ok(Self::Gps),
            "network" => Ok(Self::Network),
            "passive" => Ok(Self::Passive),
            other => Err(format!(
                "unknown provider '{}' (expected gps, network or passive)",
                other
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "gps"),
            Self::Network => write!(f, "network"),
            Self::Passive => write!(f, "passive"),
        }
    }
}

/// A source of position readings.
///
/// Calls may block (hardware queries); the session always invokes them on
/// the blocking pool.
pub trait LocationProvider: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    fn is_enabled(&self) -> bool;

    /// Most recent reading, if the provider has one.
    fn last_known_fix(&self) -> Option<LocationFix>;
}

/// Result of the platform permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// Platform positioning service: permission state plus its providers.
pub trait LocationBackend: Send + Sync {
    fn authorization(&self) -> Authorization;

    fn providers(&self) -> Vec<Arc<dyn LocationProvider>>;
}

/// Backend over a fixed provider list.
#[derive(Clone)]
pub struct StaticBackend {
    authorization: Authorization,
    providers: Vec<Arc<dyn LocationProvider>>,
}

impl StaticBackend {
    pub fn new(providers: Vec<Arc<dyn LocationProvider>>) -> Self {
        Self {
            authorization: Authorization::Granted,
            providers,
        }
    }

    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }
}

impl fmt::Debug for StaticBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("StaticBackend")
            .field("authorization", &self.authorization)
            .field("providers", &names)
            .finish()
    }
}

impl LocationBackend for StaticBackend {
    fn authorization(&self) -> Authorization {
        self.authorization
    }

    fn providers(&self) -> Vec<Arc<dyn LocationProvider>> {
        self.providers.clone()
    }
}
