//! The `photo-picker` binary: exit status and output streams.
//!
//! Run with: cargo test --test cli

use std::process::Command;
use tempfile::TempDir;

fn photo_picker(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_photo-picker"));
    cmd.current_dir(tmp.path())
        .arg("--cache-dir")
        .arg(tmp.path().join("cache"));
    cmd
}

#[test]
fn failed_pick_exits_nonzero_with_reason_on_stderr() {
    let tmp = TempDir::new().unwrap();
    let out = photo_picker(&tmp)
        .args(["pick", "--options", r#"{"outputType": 7}"#])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Pick failed:"), "stderr: {}", stderr);
    assert!(stderr.contains("outputType"), "stderr: {}", stderr);
}

#[test]
fn cancelled_pick_prints_empty_array() {
    let tmp = TempDir::new().unwrap();
    let out = photo_picker(&tmp).args(["pick"]).output().unwrap();

    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value, serde_json::json!([]));
}
