//! Drives the `image-kitchen` binary and checks exit codes and output.

use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_image-kitchen"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([90, 90, 200]))
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

#[test]
fn to_png_reports_each_file_and_a_summary() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("in");
    fs::create_dir(&src).unwrap();
    write_jpeg(&src.join("a.jpg"), 100, 100);
    fs::write(src.join("b.txt"), "x").unwrap();

    let output = run(tmp.path(), &["to-png", "in", "out"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("==> to-png: 1 file (1 skipped)"));
    assert!(text.contains("a.jpg converted to png → a.png (100x100)"));
    assert!(text.contains("Done: 1 converted, 0 failed, 1 skipped"));
    assert!(tmp.path().join("out/a.png").is_file());
}

#[test]
fn failed_file_sets_exit_code() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("in");
    fs::create_dir(&src).unwrap();
    write_jpeg(&src.join("a.jpg"), 10, 10);
    fs::write(src.join("c.jpg"), b"broken").unwrap();

    let output = run(tmp.path(), &["to-png", "in", "out"]);

    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Done: 1 converted, 1 failed, 0 skipped"));
    assert!(text.contains("    c.jpg: DecodeError"));
}

#[test]
fn missing_source_is_an_io_error() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["resize", "nowhere", "out", "--width", "5", "--height", "5"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("IOError: Source directory not found"));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn zero_thumbnail_bound_is_invalid() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("in")).unwrap();

    let output = run(
        tmp.path(),
        &["thumbnail", "in", "out", "--max-width", "0", "--max-height", "10"],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("InvalidParameters:"));
}

#[test]
fn report_flag_writes_json_summary() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("in");
    fs::create_dir(&src).unwrap();
    write_jpeg(&src.join("a.jpg"), 12, 8);

    let output = run(
        tmp.path(),
        &["to-png", "in", "out", "--report", "report.json"],
    );

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["kind"], "to-png");
    assert_eq!(report["results"][0]["filename"], "a.jpg");
    assert_eq!(report["results"][0]["dimensions"]["width"], 12);
}

#[test]
fn local_config_file_is_picked_up() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("in")).unwrap();
    fs::write(
        tmp.path().join("image-kitchen.toml"),
        "[output]\njpeg_quality = 0\n",
    )
    .unwrap();

    let output = run(tmp.path(), &["to-jpg", "in", "out"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("jpeg_quality"));
}

#[test]
fn gen_config_prints_loadable_defaults() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["gen-config"]);

    assert!(output.status.success());
    let text = stdout(&output);
    let parsed: toml::Value = toml::from_str(&text).unwrap();
    assert_eq!(parsed["output"]["jpeg_quality"].as_integer(), Some(75));
}
