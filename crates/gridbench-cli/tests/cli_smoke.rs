//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `gridbench` binary to verify that
//! argument parsing, help text, error handling and a small end-to-end run
//! work.

use std::fmt::Write as _;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("gridbench").unwrap()
}

/// Two separable blobs, alternating labels, 60 rows.
fn write_blobs(path: &Path, with_partition: bool) {
    let mut text = String::from(if with_partition {
        "f1,f2,label,split\n"
    } else {
        "f1,f2,label\n"
    });
    for i in 0..60 {
        let label = i % 2;
        let center = if label == 1 { 2.0 } else { -2.0 };
        let jitter = (i % 7) as f64 * 0.1 - 0.3;
        write!(text, "{},{},{}", center + jitter, center - jitter, label).unwrap();
        if with_partition {
            text.push_str(if i < 40 { ",train" } else { ",test" });
        }
        text.push('\n');
    }
    std::fs::write(path, text).unwrap();
}

fn write_config(path: &Path, data: &Path, extra: &str) {
    let json = format!(
        r#"{{
            "data_file": "{}",
            "model": {{ "kind": "gradient_boosted_trees",
                        "grid": [ {{ "name": "depth", "values": [1, 2] }},
                                  {{ "name": "iterations", "values": [20] }} ] }}{}
        }}"#,
        data.display(),
        extra
    );
    std::fs::write(path, json).unwrap();
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("default-config"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridbench"));
}

// ---------------------------------------------------------------------------
// default-config
// ---------------------------------------------------------------------------

#[test]
fn default_config_prints_gbdt_grid() {
    cmd()
        .arg("default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gradient_boosted_trees\""))
        .stdout(predicate::str::contains("\"shrinkage\""))
        .stdout(predicate::str::contains("\"label_column\""));
}

#[test]
fn default_config_for_svm_uses_class_labels() {
    cmd()
        .args(["default-config", "svm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"support_vector_machine\""))
        .stdout(predicate::str::contains("\"class_label\""));
}

#[test]
fn default_config_rejects_unknown_model() {
    cmd().args(["default-config", "xgboost"]).assert().failure();
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_no_config_prints_template() {
    cmd()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"data_file\""))
        .stdout(predicate::str::contains("\"model\""))
        .stderr(predicate::str::contains("No config file provided"));
}

#[test]
fn run_nonexistent_config_errors() {
    cmd()
        .args(["run", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn run_missing_data_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    write_config(&config, &dir.path().join("missing.csv"), "");
    cmd()
        .arg("run")
        .arg(&config)
        .env("GRIDBENCH_LOG", "error")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn run_writes_table_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("blobs.csv");
    let config = dir.path().join("config.json");
    let table = dir.path().join("results.tsv");
    let summary = dir.path().join("summary.json");
    write_blobs(&data, false);
    write_config(&config, &data, "");

    cmd()
        .arg("run")
        .arg(&config)
        .arg("-o")
        .arg(&table)
        .arg("--json")
        .arg(&summary)
        .args(["--threads", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 scored, 0 failed"));

    let written = std::fs::read_to_string(&table).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("index\tparams\tstatus\ttest_misclassification_rate"));
    assert_eq!(lines.count(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["complete"], serde_json::Value::Bool(true));
    assert_eq!(json["table"].as_array().unwrap().len(), 2);
    assert!(json["best"]["test_misclassification_rate"].as_f64().unwrap() < 0.1);
}

#[test]
fn run_uses_partition_column_and_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("blobs.csv");
    let config = dir.path().join("config.json");
    write_blobs(&data, true);
    write_config(&config, &data, r#", "partition_column": "split""#);

    cmd()
        .arg("run")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("depth=1, iterations=20"))
        .stdout(predicate::str::contains("depth=2, iterations=20"));
}

#[test]
fn run_model_type_override_switches_grid() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("blobs.csv");
    let config = dir.path().join("config.json");
    write_blobs(&data, false);
    write_config(&config, &data, "");

    cmd()
        .arg("run")
        .arg(&config)
        .args(["--model-type", "svm", "--threads", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel=linear, cost=0.1"))
        .stdout(predicate::str::contains("kernel=gaussian, cost=10"));
}

#[test]
fn run_multiclass_target_from_binary_label() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("blobs.csv");
    let config = dir.path().join("config.json");
    let table = dir.path().join("results.tsv");
    let summary = dir.path().join("summary.json");
    write_blobs(&data, false);
    let json = format!(
        r#"{{
            "data_file": "{}",
            "multiclass_quantiles": [0.33, 0.66],
            "model": {{ "kind": "support_vector_machine",
                        "grid": [ {{ "name": "kernel", "values": ["linear"] }},
                                  {{ "name": "cost", "values": [1.0, 10.0] }} ] }}
        }}"#,
        data.display()
    );
    std::fs::write(&config, json).unwrap();

    cmd()
        .arg("run")
        .arg(&config)
        .arg("-o")
        .arg(&table)
        .arg("--json")
        .arg(&summary)
        .args(["--threads", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Derived 3-class target"))
        .stderr(predicate::str::contains("2 scored, 0 failed"));

    let written = std::fs::read_to_string(&table).unwrap();
    assert_eq!(written.lines().count(), 3);
    assert!(written.lines().skip(1).all(|line| line.contains("\tok\t")));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["model"], "support_vector_machine");
    assert_eq!(json["best"]["status"], "ok");
    assert!(json["best"]["test_misclassification_rate"].as_f64().is_some());
}
