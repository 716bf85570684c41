//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let output_dir = config
        .conversion
        .output_dir
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();
    let replay_file = config
        .location
        .replay_file
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[conversion]
; Name shown for the document in Google Earth
document_name = {}
; Directory for generated KML files (empty = next to the source drawing)
output_dir = {}
; When the KML file already exists:
;   ask       - prompt before writing
;   overwrite - replace the existing file
;   rename    - write to name_1.kml, name_2.kml, ...
;   cancel    - leave the existing file alone
on_collision = {}

[location]
; Give up after this many seconds and report the best reading seen
timeout_secs = {}
; Seconds between provider polls
poll_interval_secs = {}
; A new reading must improve accuracy by more than this (meters)
hysteresis_m = {}
; Stop early once a reading is at least this accurate (meters)
good_enough_m = {}
; CSV of scripted fixes (provider,lat,lon,alt,accuracy) used instead of hardware
replay_file = {}

[logging]
file = {}
"#,
        config.conversion.document_name,
        output_dir,
        config.conversion.on_collision,
        config.location.timeout_secs,
        config.location.poll_interval_secs,
        config.location.hysteresis_m,
        config.location.good_enough_m,
        replay_file,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory as `~`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
