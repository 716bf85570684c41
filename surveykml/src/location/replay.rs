//! Scripted providers that replay fixes from a CSV file.
//!
//! Each non-empty line is `provider,lat,lon,alt,accuracy`, where `provider`
//! is `gps`, `network` or `passive`. Lines starting with `#` and a header
//! line starting with `provider` are ignored. Every query returns the next
//! row for that provider; once the rows run out the last one repeats.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::provider::{LocationProvider, ProviderKind, StaticBackend};
use super::state::LocationFix;

/// Errors loading a replay script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Cannot read replay file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Replay line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[derive(Debug, Default)]
struct Script {
    pending: VecDeque<LocationFix>,
    last: Option<LocationFix>,
}

/// Provider that hands out pre-recorded fixes in order.
#[derive(Debug)]
pub struct ReplayProvider {
    kind: ProviderKind,
    name: String,
    script: Mutex<Script>,
}

impl ReplayProvider {
    pub fn new(kind: ProviderKind, fixes: Vec<LocationFix>) -> Self {
        Self {
            kind,
            name: kind.to_string(),
            script: Mutex::new(Script {
                pending: fixes.into(),
                last: None,
            }),
        }
    }

    /// Fixes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .map(|s| s.pending.len())
            .unwrap_or_default()
    }
}

impl LocationProvider for ReplayProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn last_known_fix(&self) -> Option<LocationFix> {
        let mut script = self.script.lock().ok()?;
        if let Some(next) = script.pending.pop_front() {
            script.last = Some(next);
        }
        script.last.clone()
    }
}

/// Parse a replay script into one provider per provider kind, in order of
/// first appearance.
pub fn parse_replay(text: &str) -> Result<Vec<ReplayProvider>, ReplayError> {
    let mut groups: Vec<(ProviderKind, Vec<LocationFix>)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("provider") {
            continue;
        }
        let parse_error = |message: String| ReplayError::Parse {
            line: index + 1,
            message,
        };

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(parse_error(format!(
                "expected 5 fields (provider,lat,lon,alt,accuracy), found {}",
                fields.len()
            )));
        }
        let kind: ProviderKind = fields[0].parse().map_err(parse_error)?;
        let mut numbers = [0.0f64; 4];
        for (slot, field) in numbers.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .map_err(|_| parse_error(format!("'{}' is not a number", field)))?;
        }
        let [lat, lon, alt, accuracy] = numbers;
        let fix = LocationFix::new(lat, lon, accuracy, fields[0]).with_altitude(alt);

        match groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, fixes)) => fixes.push(fix),
            None => groups.push((kind, vec![fix])),
        }
    }

    Ok(groups
        .into_iter()
        .map(|(kind, fixes)| ReplayProvider::new(kind, fixes))
        .collect())
}

/// Load a replay file into a backend with permission granted.
pub fn replay_backend(path: &Path) -> Result<StaticBackend, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let providers = parse_replay(&text)?
        .into_iter()
        .map(|p| Arc::new(p) as Arc<dyn LocationProvider>)
        .collect();
    Ok(StaticBackend::new(providers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::provider::LocationBackend;

    const SCRIPT: &str = "provider,lat,lon,alt,accuracy
# cached fix from another app
passive,6.93,79.86,0,850
gps,6.9271,79.8612,12.5,35
gps,6.9271,79.8612,12.0,8
";

    #[test]
    fn test_parse_groups_by_provider() {
        let providers = parse_replay(SCRIPT).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].kind(), ProviderKind::Passive);
        assert_eq!(providers[1].kind(), ProviderKind::Gps);
        assert_eq!(providers[1].remaining(), 2);
    }

    #[test]
    fn test_replay_repeats_last_fix() {
        let providers = parse_replay(SCRIPT).unwrap();
        let gps = &providers[1];
        assert_eq!(gps.last_known_fix().unwrap().accuracy, 35.0);
        let second = gps.last_known_fix().unwrap();
        assert_eq!(second.accuracy, 8.0);
        assert_eq!(second.altitude, 12.0);
        assert_eq!(gps.last_known_fix().unwrap().accuracy, 8.0);
    }

    #[test]
    fn test_empty_provider_returns_none() {
        let provider = ReplayProvider::new(ProviderKind::Network, Vec::new());
        assert!(provider.last_known_fix().is_none());
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_replay("gps,6.9,79.8,0\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 1, .. }));

        let err = parse_replay("\n\ngps,6.9,abc,0,5\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 3, .. }));

        let err = parse_replay("fused,6.9,79.8,0,5\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_replay_backend_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fixes.csv");
        std::fs::write(&path, SCRIPT).unwrap();

        let backend = replay_backend(&path).unwrap();
        assert_eq!(backend.providers().len(), 2);

        assert!(matches!(
            replay_backend(&dir.path().join("missing.csv")),
            Err(ReplayError::Io { .. })
        ));
    }
}
