//! Collision-safe output file writes.
//!
//! All new files are created with `create_new`, so the existence check and
//! the write are one filesystem operation. Two runs aiming at the same path
//! cannot both claim it: the loser sees `AlreadyExists`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Upper bound on `_N` suffixes tried by [`write_renamed`].
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// Result of an exclusive write attempt.
#[derive(Debug)]
pub(crate) enum WriteAttempt {
    Written,
    Exists,
}

/// Create `path` and write `contents`, failing softly if it already exists.
pub(crate) fn write_exclusive(path: &Path, contents: &str) -> io::Result<WriteAttempt> {
    create_exclusive(path, |file| {
        file.write_all(contents.as_bytes())?;
        file.flush()
    })
}

/// Claim `path` with `create_new`, then let `fill` write it.
///
/// If `fill` fails the partial file is removed, so a later run does not
/// mistake it for an existing output.
fn create_exclusive<F>(path: &Path, fill: F) -> io::Result<WriteAttempt>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    ensure_parent(path)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(WriteAttempt::Exists),
        Err(e) => return Err(e),
    };

    if let Err(e) = fill(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %cleanup,
                "Failed to remove partially written output"
            );
        }
        return Err(e);
    }
    Ok(WriteAttempt::Written)
}

/// Write `contents` to `path`, replacing any existing file.
pub(crate) fn write_overwrite(path: &Path, contents: &str) -> io::Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents)
}

/// Write to the first free `<stem>_N.<ext>` next to `path`, `N = 1, 2, ...`.
///
/// Returns the path actually written.
pub(crate) fn write_renamed(path: &Path, contents: &str) -> io::Result<PathBuf> {
    for n in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = numbered(path, n);
        if let WriteAttempt::Written = write_exclusive(&candidate, contents)? {
            return Ok(candidate);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {}", path.display()),
    ))
}

/// `dir/stem.ext` → `dir/stem_N.ext`.
pub(crate) fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_numbered() {
        assert_eq!(
            numbered(Path::new("/out/plan.kml"), 3),
            PathBuf::from("/out/plan_3.kml")
        );
        assert_eq!(numbered(Path::new("plan"), 1), PathBuf::from("plan_1"));
    }

    #[test]
    fn test_exclusive_write_does_not_clobber() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.kml");

        assert!(matches!(
            write_exclusive(&path, "first").unwrap(),
            WriteAttempt::Written
        ));
        assert!(matches!(
            write_exclusive(&path, "second").unwrap(),
            WriteAttempt::Exists
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.kml");

        let err = create_exclusive(&path, |file| {
            file.write_all(b"<?xml version=\"1.0\"")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());

        // The name is free again for the next attempt.
        assert!(matches!(
            write_exclusive(&path, "complete").unwrap(),
            WriteAttempt::Written
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "complete");
    }

    #[test]
    fn test_exclusive_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/plan.kml");
        write_exclusive(&path, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_renamed_fills_smallest_gap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.kml");
        fs::write(&path, "").unwrap();
        fs::write(dir.path().join("plan_1.kml"), "").unwrap();
        fs::write(dir.path().join("plan_3.kml"), "").unwrap();

        let written = write_renamed(&path, "new").unwrap();
        assert_eq!(written, dir.path().join("plan_2.kml"));
        assert_eq!(fs::read_to_string(written).unwrap(), "new");
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.kml");
        fs::write(&path, "old contents that are longer").unwrap();
        write_overwrite(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
