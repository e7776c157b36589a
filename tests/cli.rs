use assert_cmd::Command;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([30, 90, 200])));
    img.save(path).unwrap();
}

fn padresize() -> Command {
    let mut cmd = Command::cargo_bin("padresize").unwrap();
    cmd.env_remove("PADRESIZE_CONFIG").env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_run_with_flags_writes_padded_images() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("wide.png"), 100, 50);
    write_png(&dir.path().join("tall.png"), 20, 80);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    padresize()
        .args(["run", "--width", "200", "--height", "200", "--format", "png", "--quiet", "--input"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed: 2"));

    let out = dir.path().join("Processed");
    for name in ["wide.png", "tall.png"] {
        let written = image::open(out.join(name)).unwrap();
        assert_eq!(written.dimensions(), (200, 200));
    }

    let wide = image::open(out.join("wide.png")).unwrap().to_rgb8();
    assert_eq!(*wide.get_pixel(100, 10), Rgb([255, 255, 255]));
    assert_eq!(*wide.get_pixel(100, 100), Rgb([30, 90, 200]));
    assert!(!out.join("notes.png").exists());
}

#[test]
fn test_run_prompts_for_missing_values() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("photo.png"), 64, 32);
    let out = TempDir::new().unwrap();

    padresize()
        .args(["run", "--quiet", "--output"])
        .arg(out.path())
        .write_stdin(format!("{}\n32\n32\n", dir.path().display()))
        .assert()
        .success();

    let written = image::open(out.path().join("photo.jpeg")).unwrap();
    assert_eq!(written.dimensions(), (32, 32));
}

#[test]
fn test_bad_width_exits_with_error() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("a.png"), 10, 10);

    padresize()
        .args(["run", "--width", "abc", "--height", "100", "--input"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Width must be an integer"));

    assert!(!dir.path().join("Processed").exists());
}

#[test]
fn test_bad_color_exits_with_error() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("a.png"), 10, 10);

    padresize()
        .args(["run", "-w", "10", "-H", "10", "--bg-color", "red", "--input"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("#rrggbb"));
}

#[test]
fn test_empty_folder_exits_with_error() {
    let dir = TempDir::new().unwrap();

    padresize()
        .args(["run", "-w", "10", "-H", "10", "--input"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No .png, .jpg or .jpeg images found"));
}

#[test]
fn test_broken_files_are_reported_in_json_summary() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("one.png"), 40, 30);
    write_png(&dir.path().join("two.png"), 30, 40);
    std::fs::write(dir.path().join("broken.jpg"), b"").unwrap();

    let output = padresize()
        .args(["run", "-w", "50", "-H", "50", "--json", "--input"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["succeeded"], 2);
    assert_eq!(summary["failed"], 1);

    let failed: Vec<_> = summary["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|item| item["outcome"]["status"] == "failed")
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["identifier"], "broken.jpg");
    assert_eq!(failed[0]["outcome"]["stage"], "decoding");
}

#[test]
fn test_config_file_sets_background_and_format() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("wide.png"), 100, 50);
    let config = dir.path().join("padresize.toml");
    std::fs::write(
        &config,
        "[processing]\nbackground_color = \"#000000\"\noutput_format = \"png\"\nworkers = 1\n",
    )
    .unwrap();

    padresize()
        .args(["run", "-w", "100", "-H", "100", "--quiet", "--config"])
        .arg(&config)
        .arg("--input")
        .arg(dir.path())
        .assert()
        .success();

    let written = image::open(dir.path().join("Processed").join("wide.png")).unwrap().to_rgb8();
    assert_eq!(*written.get_pixel(50, 5), Rgb([0, 0, 0]));
}

#[test]
fn test_example_and_check_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("example.toml");

    padresize()
        .args(["example-config", "--output"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    padresize()
        .arg("check-config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[processing]\nworkers = 0\n").unwrap();
    padresize().arg("check-config").arg(&bad).assert().code(1);
}

#[test]
fn test_missing_folder_is_reported_before_dimension_prompts() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-folder");

    padresize()
        .arg("run")
        .write_stdin(format!("{}\n", missing.display()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The specified input folder does not exist"))
        .stderr(predicate::str::contains("target width").not());
}
