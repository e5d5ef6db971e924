//! Batch CLI Tests
//!
//! ビルド済みの`xlsxpdf`バイナリを一時ディレクトリで実行し、終了コードと出力を確認します。

#![cfg(feature = "cli")]

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xlsxpdf"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_missing_default_input_exits_with_2() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("example.xlsx"));
    assert!(!dir.path().join("converted.pdf").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_default_paths() {
    let dir = tempfile::tempdir().unwrap();
    common::write_report(dir.path(), "example.xlsx");

    let output = run_cli(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(0));
    let pdf = fs::read(dir.path().join("converted.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn test_explicit_paths_with_page_setup() {
    let dir = tempfile::tempdir().unwrap();
    common::write_report(dir.path(), "report.xlsx");

    let output = run_cli(
        dir.path(),
        &[
            "report.xlsx",
            "report.pdf",
            "--page-size",
            "letter",
            "--landscape",
            "--sheet-name",
            "Report",
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    let pdf = fs::read(dir.path().join("report.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(!dir.path().join("converted.pdf").exists());
}

#[test]
fn test_corrupt_input_exits_with_1() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.xlsx"), b"this is not a spreadsheet").unwrap();

    let output = run_cli(dir.path(), &["broken.xlsx", "broken.pdf"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("broken.pdf").exists());
}

#[test]
fn test_unknown_sheet_exits_with_1() {
    let dir = tempfile::tempdir().unwrap();
    common::write_report(dir.path(), "example.xlsx");

    let output = run_cli(dir.path(), &["--sheet-name", "Missing"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("converted.pdf").exists());
}

#[test]
fn test_invalid_page_size_exits_with_1() {
    let dir = tempfile::tempdir().unwrap();
    common::write_report(dir.path(), "example.xlsx");

    let output = run_cli(dir.path(), &["--page-size", "b5"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown page size"));
    assert!(!dir.path().join("converted.pdf").exists());
}
