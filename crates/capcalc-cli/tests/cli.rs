//! End-to-end runs of the `capcalc` binary.
//!
//! Each test works in its own temp directory so no capcalc.toml or
//! capcalc.redb from the developer's checkout is picked up.

use std::path::Path;
use std::process::{Command, Output};

fn capcalc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_capcalc"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run capcalc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn calc_json_output_is_a_result_record() {
    let dir = tempfile::tempdir().unwrap();
    let out = capcalc(
        dir.path(),
        &[
            "calc",
            "shadow-ab",
            "--live-baseline-qps",
            "2000",
            "--fork-percent",
            "20",
            "--fork-count",
            "2",
            "--format",
            "json",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["effectiveQps"], 800.0);
    assert_eq!(value["totalCores"], 40.0);
    assert_eq!(value["rps"]["store"], 800.0);
}

#[test]
fn calc_text_report_and_missing_parameter() {
    let dir = tempfile::tempdir().unwrap();

    let out = capcalc(dir.path(), &["calc", "offline-ab", "--fill-defaults"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Offline A/B Testing"));

    let out = capcalc(dir.path(), &["calc", "offline-ab", "--queries-per-month", "1000"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("workdaysPerMonth missing"));
}

#[test]
fn broken_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("capcalc.toml"), "not = [valid").unwrap();

    let out = capcalc(dir.path(), &["coefficients", "--format", "json"]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["fanout"]["xap_lss"], 1.0);
    assert_eq!(value["cpuPerRps"]["lss"], 0.02);
}

#[test]
fn init_then_peak_profile_and_cost() {
    let dir = tempfile::tempdir().unwrap();

    let out = capcalc(dir.path(), &["init"]);
    assert!(out.status.success());
    assert!(dir.path().join("capcalc.toml").exists());

    let out = capcalc(dir.path(), &["--peak", "coefficients"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("peak fan-out"));
    assert!(text.contains("capcalc configuration"));
    assert!(text.contains("Source:       built-in defaults"));
    assert!(text.contains("target 70%, warning 80%, critical 90%"));
    assert!(text.contains("D4s_v5"));

    let out = capcalc(dir.path(), &["cost", "--cores", "10", "--format", "json"]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn save_export_clear_import() {
    let dir = tempfile::tempdir().unwrap();

    let out = capcalc(
        dir.path(),
        &["calc", "inorganic-growth", "--fill-defaults", "--save"],
    );
    assert!(out.status.success());

    let out = capcalc(dir.path(), &["state", "show"]);
    assert!(stdout(&out).contains("✓ Inorganic Growth"));

    let out = capcalc(dir.path(), &["export", "--output", "snap.json"]);
    assert!(out.status.success());

    let out = capcalc(dir.path(), &["state", "clear"]);
    assert!(out.status.success());
    let out = capcalc(dir.path(), &["state", "show"]);
    assert!(stdout(&out).contains("No saved scenarios."));

    let out = capcalc(dir.path(), &["import", "snap.json", "--mode", "merge"]);
    assert!(out.status.success());
    let out = capcalc(dir.path(), &["state", "show"]);
    assert!(stdout(&out).contains("✓ Inorganic Growth"));
}
