//! Integration tests for xmlsense CLI
//!
//! These tests run the commands on real files in a temporary directory,
//! through the library API and through the built binary.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use xmlsense_cli::{check_files, format_file, load_settings, tree_json};
use xmlsense_lsp::config::Settings;

const UNFORMATTED: &str = "<project><modelVersion>4.0.0</modelVersion>\n\n\n\n<dependencies>\n<dependency/>\n</dependencies></project>\n";

/// Final newlines are trimmed by default
const FORMATTED: &str = "<project>\n  <modelVersion>4.0.0</modelVersion>\n\n\n  <dependencies>\n    <dependency />\n  </dependencies>\n</project>";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn xmlsense(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_xmlsense"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run xmlsense")
}

#[test]
fn test_format_file_layout() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pom.xml", UNFORMATTED);

    let file = format_file(&path, &Settings::default(), false).unwrap();

    assert_eq!(file.formatted(), FORMATTED);
}

#[test]
fn test_format_file_with_config() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pom.xml", UNFORMATTED);
    let config = write(&dir, "custom.toml", "[format]\ntabSize = 4\npreservedNewlines = 0\n");

    let settings = load_settings(Some(&config)).unwrap();
    let file = format_file(&path, &settings, false).unwrap();

    assert_eq!(
        file.formatted(),
        "<project>\n    <modelVersion>4.0.0</modelVersion>\n    <dependencies>\n        <dependency />\n    </dependencies>\n</project>"
    );
}

#[test]
fn test_check_reports() {
    let dir = TempDir::new().unwrap();
    let clean = write(&dir, "clean.xml", FORMATTED);
    let dirty = write(&dir, "dirty.xml", UNFORMATTED);

    let reports = check_files(&[clean, dirty], &Settings::default()).unwrap();

    assert!(reports[0].is_formatted());
    assert!(!reports[1].is_formatted());
    assert_eq!(reports[1].first_edit, Some((1, 10)));
}

#[test]
fn test_dtd_extension_selects_dialect() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "book.dtd", "<!ELEMENT   book (title)>\n<!ENTITY  author \"me\">\n");

    let file = format_file(&path, &Settings::default(), false).unwrap();

    assert_eq!(
        file.formatted(),
        "<!ELEMENT book (title)>\n<!ENTITY author \"me\">"
    );
}

#[test]
fn test_tree_json() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.xml", "<a k=\"v\">text</a>");

    let tree = tree_json(&path, false).unwrap();

    assert_eq!(tree["node"]["kind"], "document");
    let element = &tree["children"][0];
    assert_eq!(element["node"]["kind"], "element");
    assert_eq!(element["node"]["name"], "a");
    assert_eq!(element["attributes"][0]["node"]["name"], "k");
    assert_eq!(element["children"][0]["text"], "text");
    assert_eq!(element["range"]["end"]["character"], 17);
}

#[test]
fn test_binary_check_exit_code() {
    let dir = TempDir::new().unwrap();
    write(&dir, "clean.xml", FORMATTED);

    let output = xmlsense(dir.path(), &["check", "clean.xml"]);
    assert!(output.status.success());

    write(&dir, "dirty.xml", UNFORMATTED);
    let output = xmlsense(dir.path(), &["check", "*.xml", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 2);
}

#[test]
fn test_binary_format_write() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pom.xml", UNFORMATTED);

    let output = xmlsense(dir.path(), &["format", "pom.xml", "--write"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(fs::read_to_string(&path).unwrap(), FORMATTED);
}

#[test]
fn test_binary_reads_workspace_config() {
    let dir = TempDir::new().unwrap();
    write(&dir, "xmlsense.toml", "[format]\ninsertSpaces = false\n");
    write(&dir, "a.xml", "<a><b/></a>");

    let output = xmlsense(dir.path(), &["format", "a.xml"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "<a>\n\t<b />\n</a>");
}

#[test]
fn test_binary_missing_input() {
    let dir = TempDir::new().unwrap();
    let output = xmlsense(dir.path(), &["format", "nope.xml"]);
    assert!(!output.status.success());
}
