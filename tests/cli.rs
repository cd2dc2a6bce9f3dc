use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{Builder, NamedTempFile};

fn write_quad() -> NamedTempFile {
    let obj = "\
# unit quad facing +Z
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";
    let mut tmp = Builder::new().suffix(".obj").tempfile().expect("temp model");
    tmp.write_all(obj.as_bytes()).expect("write model");
    tmp
}

fn shadow_lab() -> Command {
    let mut cmd = Command::cargo_bin("shadow-lab").expect("binary exists");
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn summary_reports_indexed_upload_and_motion() {
    let model = write_quad();
    shadow_lab()
        .arg(model.path())
        .args(["--summary-only", "--frames", "4", "--dt", "0.5", "--hold", "W"])
        .assert()
        .success()
        .stdout(contains("(4 vertices, 2 triangles)"))
        .stdout(contains("Uploaded 4 buffer(s), 152 bytes (Indexed draw of 6 elements)"))
        .stdout(contains("Issued 8 draw call(s)"))
        .stdout(contains("Rendered 4 frame(s)"))
        .stdout(contains("Camera pos=(0.60, 1.00, "))
        .stdout(contains("Model spin=90.00 deg"));
}

#[test]
fn non_indexed_upload_skips_index_buffer() {
    let model = write_quad();
    shadow_lab()
        .arg(model.path())
        .args(["--summary-only", "--frames", "1", "--non-indexed"])
        .assert()
        .success()
        .stdout(contains("(6 vertices, 2 triangles)"))
        .stdout(contains("Uploaded 3 buffer(s)"))
        .stdout(contains("(Arrays draw of 6 elements)"));
}

#[test]
fn escape_stops_after_first_frame() {
    let model = write_quad();
    shadow_lab()
        .arg(model.path())
        .args(["--summary-only", "--frames", "10", "--hold", "Escape"])
        .assert()
        .success()
        .stdout(contains("Rendered 1 frame(s)"))
        .stdout(contains("Issued 2 draw call(s)"));
}

#[test]
fn default_model_falls_back_to_cube() {
    let dir = tempfile::tempdir().expect("temp dir");
    shadow_lab()
        .current_dir(dir.path())
        .args(["--summary-only", "--frames", "2"])
        .assert()
        .success()
        .stdout(contains("Loaded model built-in cube (24 vertices, 12 triangles)"))
        .stdout(contains("Rendered 2 frame(s)"));
}

#[test]
fn missing_model_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    shadow_lab()
        .arg(dir.path().join("nope.obj"))
        .arg("--summary-only")
        .assert()
        .failure()
        .stderr(contains("failed to load model"));
}

#[test]
fn unknown_flag_is_rejected() {
    shadow_lab()
        .args(["--summary-only", "--bogus"])
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}

#[test]
fn unknown_held_key_is_rejected() {
    shadow_lab()
        .args(["--summary-only", "--hold", "F12"])
        .assert()
        .failure()
        .stderr(contains("unknown key F12"));
}
