use assert_cmd::Command;
use pptx_core::testing::{synthetic_font, TemplateBuilder, TestShape};
use pptx_core::{Frame, PptxDocument, ThemeFontSet};
use predicates::str::contains;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("deckfill").unwrap()
}

/// Template, font directory and config in a scratch directory
fn setup(placeholders: serde_json::Value) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.pptx");
    TemplateBuilder::new()
        .theme_fonts(ThemeFontSet {
            major_latin: Some("Test Sans".to_string()),
            minor_latin: Some("Test Sans".to_string()),
            ..Default::default()
        })
        .shape(
            TestShape::placeholder("Title 1", Some("title"), None)
                .with_frame(Frame {
                    x: 838_200,
                    y: 365_125,
                    cx: 10_515_600,
                    cy: 1_325_563,
                })
                .with_text("Click to add title"),
        )
        .write_to(&template)
        .unwrap();

    let fonts = dir.path().join("fonts");
    std::fs::create_dir(&fonts).unwrap();
    std::fs::write(
        fonts.join("TestSans-Regular.ttf"),
        synthetic_font("Test Sans", "Regular"),
    )
    .unwrap();

    let config = dir.path().join("config.json");
    let json = json!({
        "templatePptx": template,
        "outputPptx": dir.path().join("filled.pptx"),
        "fontDir": fonts,
        "placeholders": placeholders,
    });
    std::fs::write(&config, json.to_string()).unwrap();
    (dir, config)
}

fn title_text(path: &Path) -> String {
    let doc = PptxDocument::open(path).unwrap();
    doc.read_paragraphs(0, "Title 1").unwrap()[0].text()
}

#[test]
fn fills_title() {
    let (dir, config) = setup(json!({
        "title": { "name": "Title 1", "type": "text", "isTitle": true, "value": "Quarterly Review" }
    }));

    cmd()
        .arg("-i")
        .arg(&config)
        .assert()
        .success()
        .stderr(contains("filled 1 placeholder(s)"));

    assert_eq!(title_text(&dir.path().join("filled.pptx")), "Quarterly Review");
}

#[test]
fn output_flag_overrides_config() {
    let (dir, config) = setup(json!({
        "title": { "name": "Title 1", "type": "text", "value": "Override" }
    }));
    let output = dir.path().join("elsewhere.pptx");

    cmd()
        .arg("--input")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .arg("-v")
        .assert()
        .success();

    assert!(output.exists());
    assert!(!dir.path().join("filled.pptx").exists());
    assert_eq!(title_text(&output), "Override");
}

#[test]
fn missing_shape_fails_without_output() {
    let (dir, config) = setup(json!({
        "subtitle": { "name": "Subtitle 2", "type": "text", "value": "x" }
    }));

    cmd()
        .arg("-i")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("Placeholder 'subtitle': shape 'Subtitle 2' not found"));

    assert!(!dir.path().join("filled.pptx").exists());
}

#[test]
fn fatal_error_is_reported_once() {
    let (_dir, config) = setup(json!({
        "subtitle": { "name": "Subtitle 2", "type": "text", "value": "x" }
    }));

    let output = cmd().arg("-i").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("shape 'Subtitle 2' not found").count(), 1, "{stderr}");
}

#[test]
fn missing_config_fails() {
    cmd()
        .args(["-i", "/no/such/config.json"])
        .assert()
        .code(1)
        .stderr(contains("failed to load configuration"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"placeholders": {}}"#).unwrap();

    cmd()
        .arg("-i")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("Failed to parse configuration"));
}

#[test]
fn requires_input() {
    cmd().assert().code(1);
}

#[test]
fn prints_help() {
    cmd().arg("--help").assert().success().stdout(contains("--input"));
}
