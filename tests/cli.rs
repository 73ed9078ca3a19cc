use std::fs;

use assert_cmd::Command;
use cocosplit::materialize::descriptor::read_descriptor;
use predicates::prelude::*;

mod common;

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("cocosplit 0.1.0\n");
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn convert_writes_labels_and_descriptor() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("train.json");
    let images = temp.path().join("images");
    let output = temp.path().join("out");
    fs::write(&json, common::SAMPLE_COCO).expect("write annotations");
    common::touch_images(&images, &["a.jpg", "b.jpg"]);

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("convert")
        .arg("--train-json")
        .arg(&json)
        .arg("--train-images")
        .arg(&images)
        .arg("--output")
        .arg(&output);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 classes: ripe, unripe"));

    let descriptor = fs::read_to_string(output.join("dataset.yaml")).expect("read descriptor");
    assert!(descriptor.contains("nc: 2"));
    assert!(output.join("train/labels").is_dir());
    assert!(output.join("val/labels").is_dir());
}

#[test]
fn relative_output_gets_an_absolute_descriptor_root() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(temp.path().join("train.json"), common::SAMPLE_COCO).expect("write annotations");
    common::touch_images(&temp.path().join("images"), &["a.jpg", "b.jpg"]);

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.current_dir(temp.path()).args([
        "convert",
        "--train-json",
        "train.json",
        "--train-images",
        "images",
        "-o",
        "out",
    ]);
    cmd.assert().success();

    let descriptor = read_descriptor(&temp.path().join("out/dataset.yaml")).expect("read descriptor");
    let root = std::path::PathBuf::from(&descriptor.path);
    assert!(root.is_absolute(), "descriptor root {root:?} is relative");
    assert_eq!(
        root,
        fs::canonicalize(temp.path().join("out")).expect("canonical output")
    );
}

#[test]
fn convert_json_report_lists_issue_codes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("train.json");
    let images = temp.path().join("images");
    fs::write(&json, common::SAMPLE_COCO).expect("write annotations");
    common::touch_images(&images, &["a.jpg", "b.jpg"]);

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("convert")
        .arg("--train-json")
        .arg(&json)
        .arg("--train-images")
        .arg(&images)
        .arg("--output")
        .arg(temp.path().join("out"))
        .args(["--box-policy", "drop", "--report", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"box_policy\": \"drop\""))
        .stdout(predicate::str::contains("\"code\": \"outside_boxes_dropped\""));
}

#[test]
fn convert_rejects_bad_ratio() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("train.json");
    fs::write(&json, common::SAMPLE_COCO).expect("write annotations");

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("convert")
        .arg("--train-json")
        .arg(&json)
        .arg("--train-images")
        .arg(temp.path())
        .arg("--output")
        .arg(temp.path().join("out"))
        .args(["--val-ratio", "1.5"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid configuration"));
}

#[test]
fn convert_reports_missing_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("train.json");
    fs::write(&json, common::SAMPLE_COCO).expect("write annotations");

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("convert")
        .arg("--train-json")
        .arg(&json)
        .arg("--train-images")
        .arg(temp.path().join("nowhere"))
        .arg("--output")
        .arg(temp.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Image not found"));
}

#[test]
fn test_json_requires_test_images() {
    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.args([
        "convert",
        "--train-json",
        "train.json",
        "--train-images",
        "images",
        "--output",
        "out",
        "--test-json",
        "test.json",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("--test-images"));
}

#[test]
fn resplit_moves_half_and_reports() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    common::write_pool_images(&root.join("val/images"), 6);

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("resplit").arg("--root").arg(root).args(["--seed", "3"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Moved 3 of 6 images from 'val' to 'test'"));

    let mut again = Command::cargo_bin("cocosplit").unwrap();
    again.arg("resplit").arg("--root").arg(root);
    again
        .assert()
        .success()
        .stdout(predicate::str::contains("already populated"));
}

#[test]
fn inspect_prints_class_mapping() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("train.json");
    fs::write(&json, common::SAMPLE_COCO).expect("write annotations");

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("inspect").arg(&json);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Classes (2)"))
        .stdout(predicate::str::contains("ripe"));

    let mut json_cmd = Command::cargo_bin("cocosplit").unwrap();
    json_cmd.arg("inspect").arg(&json).args(["--output", "json"]);
    json_cmd
        .assert()
        .success()
        .stdout(predicate::str::contains("\"images_without_annotations\": 0"));
}

#[test]
fn inspect_malformed_file_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let json = temp.path().join("bad.json");
    fs::write(&json, r#"{"images": [{"id": 1}]}"#).expect("write annotations");

    let mut cmd = Command::cargo_bin("cocosplit").unwrap();
    cmd.arg("inspect").arg(&json);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Malformed image record"));
}
