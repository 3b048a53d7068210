use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("fallrisk").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn assert_png(path: &std::path::Path) {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.len() > PNG_MAGIC.len(), "chart is empty");
    assert_eq!(&bytes[..8], &PNG_MAGIC);
}

#[test]
fn standard_run_prints_both_parameter_lines_and_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.png");

    cmd()
        .arg("--no-show")
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Fitted logistic params (serious injury): L,x0,k = ["))
        .stdout(contains("Fitted logistic params (death): L,x0,k = ["));

    assert_png(&out);
}

#[test]
fn existing_chart_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.png");
    fs::write(&out, b"not a png").unwrap();

    cmd().arg("--no-show").arg("-o").arg(&out).assert().success();

    assert_png(&out);
}

#[test]
fn low_dpi_run_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("small.png");

    cmd()
        .args(["--no-show", "--dpi", "50"])
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_png(&out);
}

#[test]
fn unwritable_output_fails_with_io_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing").join("chart.png");

    cmd()
        .arg("--no-show")
        .arg("-o")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(contains("chart.png"));
}

#[test]
fn oversized_figure_fails_with_input_code_and_keeps_existing_chart() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.png");
    fs::write(&out, b"hello").unwrap();

    cmd()
        .args(["--no-show", "--fig-width", "100", "--fig-height", "100", "--dpi", "1200"])
        .arg("-o")
        .arg(&out)
        .assert()
        .code(3)
        .stderr(contains("exceeds the limit"));

    assert_eq!(fs::read(&out).unwrap(), b"hello");
}

#[test]
fn exhausted_budget_fails_with_fit_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.png");

    cmd()
        .args(["--no-show", "--max-evals", "2"])
        .arg("-o")
        .arg(&out)
        .assert()
        .code(4)
        .stderr(contains("did not converge"))
        .stdout(contains("Fitted logistic params").not());
}

#[test]
fn exports_and_summary_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.png");
    let json = dir.path().join("fits.json");
    let csv = dir.path().join("grid.csv");

    cmd()
        .args(["--no-show", "--summary"])
        .arg("-o")
        .arg(&out)
        .arg("--export-curve")
        .arg(&json)
        .arg("--export-samples")
        .arg(&csv)
        .assert()
        .success()
        .stdout(contains("Residuals"));

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(doc["curves"].as_array().map(|c| c.len()), Some(2));

    let grid = fs::read_to_string(&csv).unwrap();
    let mut lines = grid.lines();
    assert_eq!(lines.next(), Some("height_m,p_serious,p_death"));
    assert_eq!(lines.count(), 601);
}
