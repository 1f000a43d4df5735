//! End-to-end tests for the dbc-diff binary.
//!
//! Each test builds old/new DBC trees inside a TempDir and runs the binary
//! built by cargo against them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const BODY_OLD: &str = r#"VERSION "1.0"

BU_: ECU DASH

BO_ 256 Engine: 8 ECU
 SG_ Speed : 0|16@1+ (0.25,0) [0|16383.75] "rpm" DASH
"#;

const BODY_NEW: &str = r#"VERSION "1.0"

BU_: ECU DASH

BO_ 256 Engine: 8 ECU
 SG_ Speed : 0|16@1+ (0.25,0) [0|16383.75] "km/h" DASH
 SG_ Temp : 16|8@1- (1,-40) [-40|215] "degC" DASH
"#;

const GONE: &str = r#"VERSION "2.0"

BO_ 512 Doors: 2 GW
 SG_ Open : 0|1@1+ (1,0) [0|1] "" DASH
VAL_ 512 Open 0 "Closed" 1 "Open" ;
"#;

const FRESH: &str = r#"VERSION "3.0"

BO_ 768 Lights: 1 GW
 SG_ Beam : 0|2@1+ (1,0) [0|3] "" DASH
"#;

const SAME: &str = r#"VERSION "1.1"

BO_ 1024 Clock: 4 GW
 SG_ Seconds : 0|32@1+ (1,0) [0|0] "s" DASH
"#;

fn dbc_diff(dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_dbc-diff"))
        .current_dir(dir)
        .args(args)
        .output()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write(dir: &Path, relative: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// old/: body, gone, same    new/: body (changed), fresh, same
fn setup_trees(dir: &Path) -> std::io::Result<()> {
    write(dir, "old/body.dbc", BODY_OLD)?;
    write(dir, "old/legacy/gone.dbc", GONE)?;
    write(dir, "old/same.dbc", SAME)?;
    write(dir, "old/readme.txt", "not a database")?;
    write(dir, "new/body.dbc", BODY_NEW)?;
    write(dir, "new/fresh.dbc", FRESH)?;
    write(dir, "new/nested/same.dbc", SAME)?;
    fs::create_dir_all(dir.join("out"))?;
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

#[test]
fn test_directory_comparison_json() -> TestResult {
    let dir = TempDir::new()?;
    setup_trees(dir.path())?;

    let output = dbc_diff(
        dir.path(),
        &["-f", "old", "-t", "new", "-r", "json", "-n", "report", "-o", "out"],
    )?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report = read_json(&dir.path().join("out/report.json"))?;
    let files = report.as_object().ok_or("report is not an object")?;
    let names: Vec<&String> = files.keys().collect();
    assert_eq!(names, vec!["body.dbc", "fresh.dbc", "gone.dbc"]);

    let body = &report["body.dbc"];
    assert_eq!(body["action"], "changed");
    assert_eq!(body["same_version"], true);
    assert_eq!(body["old_version"], "1.0");
    assert_eq!(body["changed"]["Engine"]["action"], "changed");
    assert_eq!(body["changed"]["Engine"]["changed"], serde_json::json!([]));
    assert_eq!(
        body["changed"]["Engine"]["signals"]["Speed"]["changed"],
        serde_json::json!([{"name": "unit", "old": "rpm", "new": "km/h"}])
    );
    assert_eq!(body["changed"]["Engine"]["signals"]["Temp"]["action"], "added");

    let gone = &report["gone.dbc"];
    assert_eq!(gone["action"], "removed");
    assert_eq!(gone["old_version"], "2.0");
    assert!(gone.get("new_version").is_none());
    assert_eq!(gone["same_version"], false);
    let open = &gone["removed"]["Doors"]["signals"]["Open"];
    assert_eq!(open["action"], "removed");
    let choices = open["removed"]
        .as_array()
        .ok_or("removed is not a list")?
        .iter()
        .find(|p| p["name"] == "choices")
        .ok_or("choices missing")?;
    assert_eq!(choices["old"], serde_json::json!({"0": "Closed", "1": "Open"}));
    assert_eq!(choices["new"], serde_json::Value::Null);

    assert_eq!(report["fresh.dbc"]["action"], "added");
    assert_eq!(report["fresh.dbc"]["new_version"], "3.0");
    Ok(())
}

#[test]
fn test_unchanged_flag_and_default_name() -> TestResult {
    let dir = TempDir::new()?;
    setup_trees(dir.path())?;

    let output = dbc_diff(dir.path(), &["--old", "old", "--new", "new", "--reports", "json", "-u"])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report = read_json(&dir.path().join("dbc-diff.json"))?;
    assert_eq!(report["same.dbc"]["action"], "unchanged");
    assert_eq!(report["same.dbc"]["unchanged"], serde_json::json!({}));
    assert_eq!(report["same.dbc"]["same_version"], true);
    Ok(())
}

#[test]
fn test_single_file_rename() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.dbc", BODY_OLD)?;
    write(dir.path(), "b.dbc", BODY_NEW)?;

    let output = dbc_diff(dir.path(), &["-f", "a.dbc", "-t", "b.dbc", "-r", "json"])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report = read_json(&dir.path().join("dbc-diff.json"))?;
    assert_eq!(report["a.dbc -> b.dbc"]["action"], "changed");
    assert_eq!(report.as_object().map(|o| o.len()), Some(1));
    Ok(())
}

#[test]
fn test_markdown_report_from_template() -> TestResult {
    let dir = TempDir::new()?;
    setup_trees(dir.path())?;
    let templates = templates_dir();
    let templates = templates.to_str().ok_or("non UTF-8 manifest dir")?;

    let output = dbc_diff(
        dir.path(),
        &[
            "-f", "old", "-t", "new", "-r", "json,md", "-o", "out", "-i", "build 7",
            "--templates", templates,
        ],
    )?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("out/dbc-diff.json").exists());

    let markdown = fs::read_to_string(dir.path().join("out/dbc-diff.md"))?;
    assert!(markdown.contains("Build info: build 7"));
    assert!(markdown.contains("## body.dbc (changed)"));
    assert!(markdown.contains("#### Signal `Speed` (changed)"));
    assert!(markdown.contains("| unit | rpm | km/h |"));
    assert!(markdown.contains("## gone.dbc (removed)"));
    Ok(())
}

#[test]
fn test_missing_template_is_fatal_and_writes_nothing() -> TestResult {
    let dir = TempDir::new()?;
    setup_trees(dir.path())?;
    fs::create_dir_all(dir.path().join("no-templates"))?;

    let output = dbc_diff(
        dir.path(),
        &[
            "-f", "old", "-t", "new", "-r", "json,html", "-o", "out",
            "--templates", "no-templates",
        ],
    )?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E031"));
    assert!(stderr(&output).contains("dbc-diff.html.jinja2"));
    assert!(!dir.path().join("out/dbc-diff.json").exists());
    Ok(())
}

#[test]
fn test_missing_input_path() -> TestResult {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("new"))?;

    let output = dbc_diff(dir.path(), &["-f", "nowhere", "-t", "new", "-r", "json"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E001"));
    assert!(stderr(&output).contains("nowhere"));
    Ok(())
}

#[test]
fn test_empty_report_list() -> TestResult {
    let dir = TempDir::new()?;
    setup_trees(dir.path())?;

    let output = dbc_diff(dir.path(), &["-f", "old", "-t", "new", "-r", " , "])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E030"));
    Ok(())
}

#[test]
fn test_non_dbc_file_is_fatal() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "old.dbc", "{\"this\": \"is json\"}")?;
    write(dir.path(), "new.dbc", BODY_NEW)?;

    let output = dbc_diff(dir.path(), &["-f", "old.dbc", "-t", "new.dbc", "-r", "json"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E010"));
    assert!(!dir.path().join("dbc-diff.json").exists());
    Ok(())
}
