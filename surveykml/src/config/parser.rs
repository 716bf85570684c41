//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [conversion] section
    if let Some(section) = ini.section(Some("conversion")) {
        if let Some(v) = section.get("document_name") {
            let v = v.trim();
            if !v.is_empty() {
                config.conversion.document_name = v.to_string();
            }
        }
        if let Some(v) = section.get("output_dir") {
            config.conversion.output_dir = optional_path(v);
        }
        if let Some(v) = section.get("on_collision") {
            config.conversion.on_collision =
                v.parse().map_err(|reason| invalid("conversion", "on_collision", v, reason))?;
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = parse_seconds(section, "timeout_secs")? {
            config.location.timeout_secs = v;
        }
        if let Some(v) = parse_seconds(section, "poll_interval_secs")? {
            config.location.poll_interval_secs = v;
        }
        if let Some(v) = section.get("hysteresis_m") {
            config.location.hysteresis_m = parse_meters(v, false)
                .map_err(|reason| invalid("location", "hysteresis_m", v, reason))?;
        }
        if let Some(v) = section.get("good_enough_m") {
            config.location.good_enough_m = parse_meters(v, true)
                .map_err(|reason| invalid("location", "good_enough_m", v, reason))?;
        }
        if let Some(v) = section.get("replay_file") {
            config.location.replay_file = optional_path(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: String) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn parse_seconds(section: &Properties, key: &str) -> Result<Option<u64>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    parse_positive_secs(v)
        .map(Some)
        .map_err(|reason| invalid("location", key, v, reason))
}

/// Parse a whole number of seconds, at least 1.
pub(super) fn parse_positive_secs(value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("must be a whole number of seconds, at least 1".to_string()),
    }
}

/// Parse a distance in meters; `strict` rejects zero.
pub(super) fn parse_meters(value: &str, strict: bool) -> Result<f64, String> {
    let n: f64 = value
        .trim()
        .parse()
        .map_err(|_| "must be a number of meters".to_string())?;
    if !n.is_finite() || n < 0.0 || (strict && n == 0.0) {
        return Err(if strict {
            "must be greater than zero".to_string()
        } else {
            "must be zero or positive".to_string()
        });
    }
    Ok(n)
}

/// Convert empty string to None, non-empty to Some path with tilde expansion.
pub(super) fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CollisionPolicy;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, content).unwrap();
        ConfigFile::load_from(&path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[location]
timeout_secs = 30
"#,
        )
        .unwrap();

        assert_eq!(config.location.timeout_secs, 30);
        assert_eq!(config.location.poll_interval_secs, 2);
        assert_eq!(config.conversion.on_collision, CollisionPolicy::Ask);
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[conversion]
document_name = Galle Road widening
output_dir = /srv/kml
on_collision = Overwrite

[location]
timeout_secs = 120
poll_interval_secs = 5
hysteresis_m = 0
good_enough_m = 7.5
replay_file = /tmp/fixes.csv

[logging]
file = /var/log/surveykml.log
"#,
        )
        .unwrap();

        assert_eq!(config.conversion.document_name, "Galle Road widening");
        assert_eq!(config.conversion.output_dir, Some(PathBuf::from("/srv/kml")));
        assert_eq!(config.conversion.on_collision, CollisionPolicy::Overwrite);
        assert_eq!(config.location.poll_interval_secs, 5);
        assert_eq!(config.location.hysteresis_m, 0.0);
        assert_eq!(config.location.good_enough_m, 7.5);
        assert_eq!(
            config.location.replay_file,
            Some(PathBuf::from("/tmp/fixes.csv"))
        );
        assert_eq!(config.logging.file, PathBuf::from("/var/log/surveykml.log"));
    }

    #[test]
    fn test_invalid_collision_policy() {
        let err = load("[conversion]\non_collision = merge\n").unwrap_err();
        assert!(err.to_string().contains("on_collision"));
        assert!(err.to_string().contains("must be one of:"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = load("[location]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "timeout_secs"
        ));
    }

    #[test]
    fn test_negative_hysteresis_rejected() {
        assert!(load("[location]\nhysteresis_m = -1\n").is_err());
        assert!(load("[location]\ngood_enough_m = 0\n").is_err());
        assert!(load("[location]\ngood_enough_m = nan\n").is_err());
    }

    #[test]
    fn test_empty_optional_paths() {
        let config = load("[conversion]\noutput_dir =\n[location]\nreplay_file =\n").unwrap();
        assert!(config.conversion.output_dir.is_none());
        assert!(config.location.replay_file.is_none());
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/surveys/plan.dxf");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("surveys/plan.dxf"));
        }
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
