//! Integration tests for the `surveykml` binary.
//!
//! Each test runs the built binary with `HOME` pointed at a temporary
//! directory and an explicit `--config` file, so nothing touches the real
//! user configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Scratch home directory plus a config path inside it.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    fn config(&self) -> PathBuf {
        self.path().join("config.ini")
    }

    /// Copy the shared DXF fixture into the sandbox.
    fn drawing(&self) -> PathBuf {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../surveykml/tests/fixtures/site.dxf");
        let target = self.path().join("site.dxf");
        fs::copy(fixture, &target).expect("Failed to copy fixture");
        target
    }

    /// Run the CLI and capture output.
    fn run(&self, args: &[&str]) -> Output {
        let config = self.config();
        Command::new(env!("CARGO_BIN_EXE_surveykml"))
            .env("HOME", self.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&config)
            .args(args)
            .output()
            .expect("Failed to execute CLI command")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert a command succeeded.
fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        panic!(
            "{} failed:\nstdout: {}\nstderr: {}",
            context,
            stdout(output),
            stderr(output)
        );
    }
}

/// Assert a command failed with `needle` on stderr.
fn assert_failure(output: &Output, needle: &str) {
    assert!(
        !output.status.success(),
        "expected failure, got stdout: {}",
        stdout(output)
    );
    assert!(
        stderr(output).contains(needle),
        "stderr missing '{}': {}",
        needle,
        stderr(output)
    );
}

// =============================================================================
// transform
// =============================================================================

#[test]
fn test_transform_projection_origin() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["transform", "to-wgs84", "500000", "500000"]);
    assert_success(&output, "transform to-wgs84");

    let text = stdout(&output);
    assert!(text.contains("Latitude:  7.0008032"), "{}", text);
    assert!(text.contains("Longitude: 80.7737357"), "{}", text);
}

#[test]
fn test_transform_rejects_far_grid_point() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["transform", "to-wgs84", "5000000", "0"]);
    assert_failure(&output, "Cannot transform coordinate");
}

// =============================================================================
// layers and convert
// =============================================================================

#[test]
fn test_layers_lists_fixture() {
    let sandbox = Sandbox::new();
    let drawing = sandbox.drawing();

    let output = sandbox.run(&["layers", drawing.to_str().unwrap()]);
    assert_success(&output, "layers");

    let text = stdout(&output);
    for name in ["Lots", "Boundary Wall", "Roads", "Notes"] {
        assert!(text.contains(name), "missing layer {}: {}", name, text);
    }
    assert!(text.contains("4 of 4 layers selected"));
}

#[test]
fn test_convert_then_rename_on_collision() {
    let sandbox = Sandbox::new();
    let drawing = sandbox.drawing();
    let out = sandbox.path().join("kml");
    let out_arg = out.to_str().unwrap();

    let first = sandbox.run(&["convert", drawing.to_str().unwrap(), "--output", out_arg]);
    assert_success(&first, "first convert");
    assert!(stdout(&first).contains("[100%]"));
    assert!(out.join("site.kml").exists());

    let second = sandbox.run(&[
        "convert",
        drawing.to_str().unwrap(),
        "--output",
        out_arg,
        "--on-collision",
        "rename",
        "--color",
        "Roads=Orange",
    ]);
    assert_success(&second, "second convert");
    let renamed = fs::read_to_string(out.join("site_1.kml")).unwrap();
    assert!(renamed.contains("<color>ff0066ff</color>"));
}

#[test]
fn test_convert_collision_without_terminal_needs_flag() {
    let sandbox = Sandbox::new();
    let drawing = sandbox.drawing();
    fs::write(sandbox.path().join("site.kml"), "keep me").unwrap();

    let output = sandbox.run(&["convert", drawing.to_str().unwrap()]);
    assert_failure(&output, "--on-collision");
    assert_eq!(
        fs::read_to_string(sandbox.path().join("site.kml")).unwrap(),
        "keep me"
    );
}

#[test]
fn test_convert_only_degenerate_layer_fails() {
    let sandbox = Sandbox::new();
    let drawing = sandbox.drawing();

    let output = sandbox.run(&["convert", drawing.to_str().unwrap(), "--only", "Notes"]);
    assert_failure(&output, "Nothing was converted");
    assert!(!sandbox.path().join("site.kml").exists());
}

#[test]
fn test_convert_unknown_layer() {
    let sandbox = Sandbox::new();
    let drawing = sandbox.drawing();

    let output = sandbox.run(&["convert", drawing.to_str().unwrap(), "--exclude", "Contours"]);
    assert_failure(&output, "Unknown layer 'Contours'");
}

// =============================================================================
// config
// =============================================================================

#[test]
fn test_config_set_get_round_trip() {
    let sandbox = Sandbox::new();

    let set = sandbox.run(&["config", "set", "conversion.on_collision", "overwrite"]);
    assert_success(&set, "config set");
    assert!(sandbox.config().exists());

    let get = sandbox.run(&["config", "get", "conversion.on_collision"]);
    assert_success(&get, "config get");
    assert_eq!(stdout(&get).trim(), "overwrite");

    let bad = sandbox.run(&["config", "set", "location.timeout_secs", "0"]);
    assert_failure(&bad, "location.timeout_secs");

    let unknown = sandbox.run(&["config", "get", "cache.directory"]);
    assert_failure(&unknown, "Unknown configuration key");
}

// =============================================================================
// locate
// =============================================================================

#[test]
fn test_locate_with_replay() {
    let sandbox = Sandbox::new();
    let replay = sandbox.path().join("fixes.csv");
    fs::write(
        &replay,
        "provider,lat,lon,alt,accuracy\ngps,6.9271,79.8612,12,30\ngps,6.9271,79.8612,12,6\n",
    )
    .unwrap();

    let set = sandbox.run(&["config", "set", "location.poll_interval_secs", "1"]);
    assert_success(&set, "config set poll interval");

    let output = sandbox.run(&["locate", "--replay", replay.to_str().unwrap(), "--timeout", "10"]);
    assert_success(&output, "locate");

    let text = stdout(&output);
    assert!(text.contains("Accuracy: ±6.0 m (live)"), "{}", text);
    assert!(text.contains("North:"));
    assert!(text.contains("https://maps.google.com/?q=6.927100,79.861200"));
}

#[test]
fn test_locate_without_backend() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["locate"]);
    assert_failure(&output, "No positioning backend");
}
