use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const SERVER_JSON: &str = r#"{
  "program": "server",
  "description": "Serve files from a directory.",
  "arguments": [
    { "name": "root", "type": "directory", "position": 0, "description": "Directory to serve." },
    { "name": "listen", "short": "l", "type": "endpoint", "default": "127.0.0.1:8080" },
    { "name": "header", "type": "string", "arity": "zero_or_many" },
    { "name": "quiet", "short": "q", "type": "bool", "description": "Suppress request logging." }
  ]
}"#;

const COPY_YAML: &str = r#"
arguments:
  - name: target
    type: path
    position: 0
  - name: sources
    type: path
    position: 1
    arity: one_or_many
"#;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write schema");
    path
}

fn cmdbind(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdbind"))
        .args(args)
        .output()
        .expect("failed to run cmdbind")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_reports_validated_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "server.json", SERVER_JSON);
    write_file(&dir, "copy.yaml", COPY_YAML);
    write_file(&dir, "notes.txt", "ignored");

    let output = cmdbind(&["check", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Validated 2 schema file(s).");
}

#[test]
fn check_rejects_variadic_positional_not_last() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "bad.json",
        r#"{"arguments": [
            {"name": "files", "type": "path", "position": 0, "arity": "one_or_many"},
            {"name": "target", "type": "path", "position": 1}
        ]}"#,
    );

    let output = cmdbind(&["check", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("error: invalid schema"), "stderr: {err}");
    assert!(err.contains("files"), "stderr: {err}");
}

#[test]
fn check_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "schema.toml", "");

    let output = cmdbind(&["check", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("must end in .json, .yaml or .yml"));
}

#[test]
fn check_rejects_missing_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let output = cmdbind(&["check", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("does not exist"));
}

// ---------------------------------------------------------------------------
// usage
// ---------------------------------------------------------------------------

#[test]
fn usage_prints_help_block() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "server.json", SERVER_JSON);

    let output = cmdbind(&["usage", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Serve files from a directory.\n\nserver --root <Path>\n\n"));
    assert!(text.contains("--listen / -l : Endpoint = 127.0.0.1:8080"));
    assert!(text.contains("--quiet / -q"));
    assert!(text.contains("Suppress request logging."));
}

#[test]
fn usage_defaults_program_to_file_stem() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "copy.yml", COPY_YAML);

    let output = cmdbind(&["usage", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("copy --target <Path> --sources <Path>[]\n"));
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

#[test]
fn bind_prints_values_as_json() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "server.json", SERVER_JSON);

    let output = cmdbind(&[
        "bind",
        path.to_str().unwrap(),
        "--",
        "/srv/www",
        "--header",
        "X-A: 1",
        "-q",
        "--header",
        "X-B: 2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "root": "/srv/www",
            "listen": "127.0.0.1:8080",
            "header": ["X-A: 1", "X-B: 2"],
            "quiet": true
        })
    );
}

#[test]
fn bind_pretty_output_spans_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "copy.yaml", COPY_YAML);

    let output = cmdbind(&["bind", path.to_str().unwrap(), "--pretty", "--", "out", "a", "b"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.lines().count() > 1);
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["sources"], serde_json::json!(["a", "b"]));
}

#[test]
fn bind_help_request_exits_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "server.json", SERVER_JSON);

    let output = cmdbind(&["bind", path.to_str().unwrap(), "--", "--bogus-is-never-seen", "-h"]);
    // The unknown option comes first, so this is an error, not help.
    assert_eq!(output.status.code(), Some(1));

    let output = cmdbind(&["bind", path.to_str().unwrap(), "--", "-h", "--bogus"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("server --root <Path>"));
    assert!(stderr(&output).is_empty());
}

#[test]
fn bind_reports_all_missing_arguments() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "copy.yaml", COPY_YAML);

    let output = cmdbind(&["bind", path.to_str().unwrap(), "--"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    let mut lines = err.lines();
    assert_eq!(lines.next(), Some("missing mandatory argument '--target'"));
    assert_eq!(lines.next(), Some("missing mandatory argument '--sources'"));
    assert!(err.contains("copy --target <Path> --sources <Path>[]"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn bind_reports_invalid_value() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "server.json", SERVER_JSON);

    let output = cmdbind(&["bind", path.to_str().unwrap(), "--", "/srv", "--listen", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).starts_with("cannot parse 'nowhere' as 'Endpoint'"),
        "stderr: {}",
        stderr(&output)
    );
}
