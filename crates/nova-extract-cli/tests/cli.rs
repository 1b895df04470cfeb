use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn extract() -> Command {
    Command::cargo_bin("nova-extract-class").unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

const POINT: &str = r#"class Point {
    int x;
    int y;

    int distanceSq() {
        return x * x + y * y;
    }
}
"#;

#[test]
fn help_mentions_selection_flags() {
    extract().arg("--help").assert().success().stdout(
        predicate::str::contains("--class")
            .and(predicate::str::contains("--field"))
            .and(predicate::str::contains("--method"))
            .and(predicate::str::contains("--public-inner"))
            .and(predicate::str::contains("--check")),
    );
}

#[test]
fn prints_the_synthesized_class() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "Point.java", POINT);

    extract()
        .arg(&file)
        .args(["--class", "Point", "--name", "ExtractedPoint", "--method", "distanceSq"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("public class ExtractedPoint {\n")
                .and(predicate::str::contains("    private final Point point;\n"))
                .and(predicate::str::contains(
                    "return point.getX() * point.getX() + point.getY() * point.getY();",
                )),
        );
}

#[test]
fn json_report_includes_back_pointer() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "Point.java", POINT);

    let output = extract()
        .arg(&file)
        .args(["--class", "Point", "--name", "ExtractedPoint", "--method", "distanceSq"])
        .arg("--json")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["back_pointer"]["required"], serde_json::Value::Bool(true));
    assert_eq!(v["back_pointer"]["field_name"], "point");
    assert!(v["unresolved"].as_array().unwrap().is_empty());
    assert!(v["text"].as_str().unwrap().contains("int distanceSq()"));
}

#[test]
fn check_reports_writes_used_as_values() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "Tally.java",
        "class Tally {\n    int hits;\n    int peek() { return hits++; }\n}\n",
    );

    extract()
        .arg(&file)
        .args(["--class", "Tally", "--name", "TallyOps", "--method", "peek", "--check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "error: increment of field 'hits' is used as a value",
        ));

    extract()
        .arg(&file)
        .args(["--class", "Tally", "--name", "TallyOps", "--field", "hits", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn config_prefixes_shape_generated_names() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "Timer.java",
        "class Timer {\n    long mElapsed;\n    void reset() { mElapsed = 0; }\n}\n",
    );
    let config = write(
        temp.path(),
        "extract-class.toml",
        "[naming]\nfield_prefix = \"m\"\n\n[logging]\nlevel = \"warn\"\n",
    );

    extract()
        .arg(&file)
        .args(["--class", "Timer", "--name", "TimerReset", "--method", "reset"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("private final Timer mTimer;")
                .and(predicate::str::contains("mTimer.setElapsed(0);")),
        );
}

#[test]
fn accessor_flags_emit_prototypes() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "Stats.java",
        "package metrics;\n\nclass Stats {\n    long total;\n}\n",
    );

    extract()
        .arg(&file)
        .args(["--class", "Stats", "--name", "Totals", "--field", "total"])
        .args(["--getter", "total", "--setter", "total", "--package", "metrics.core"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("package metrics.core;\n\npublic class Totals {\n")
                .and(predicate::str::contains("public long getTotal() {"))
                .and(predicate::str::contains("public void setTotal(long total) {")),
        );
}

#[test]
fn unknown_class_exits_with_error() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "Point.java", POINT);

    extract()
        .arg(&file)
        .args(["--class", "Nope", "--name", "Other"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("class 'Nope' not found"));
}

#[test]
fn syntax_errors_exit_with_error() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "Broken.java", "class Broken { int x = ; }\n");

    extract()
        .arg(&file)
        .args(["--class", "Broken", "--name", "Fixed"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn missing_file_exits_with_error() {
    let temp = TempDir::new().unwrap();

    extract()
        .arg(temp.path().join("Missing.java"))
        .args(["--class", "Missing", "--name", "Other"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));
}
