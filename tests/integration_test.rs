// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for wcagbot

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wcagbot::config::{Config, FixConfig};
use wcagbot::findings::{Criterion, ScanSnapshot, Severity};
use wcagbot::fix::apply_fixes;
use wcagbot::render::{BrowserRenderer, Renderer, StaticRenderer};
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::scanner;
use wcagbot::store::SnapshotStore;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

async fn scan_path(path: &Path) -> ScanSnapshot {
    let config = Config::default();
    let renderer = StaticRenderer::new(&config.render).expect("renderer");
    scan_with(path, &renderer).await
}

async fn scan_with(path: &Path, renderer: &dyn Renderer) -> ScanSnapshot {
    scanner::scan(path.to_str().expect("utf-8 path"), renderer, &Config::default())
        .await
        .expect("scan should succeed")
}

/// A page whose styles live in an external stylesheet
fn linked_stylesheet_page(dir: &TempDir) -> PathBuf {
    std::fs::write(
        dir.path().join("site.css"),
        "p { color: #eee } a:focus { outline: none }",
    )
    .unwrap();
    let path = dir.path().join("index.html");
    std::fs::write(
        &path,
        r#"<!DOCTYPE html>
<html><head><link rel="stylesheet" href="site.css"></head>
<body>
<p>Hard to read</p>
<a href="/next">Next</a>
</body></html>
"#,
    )
    .unwrap();
    path
}

#[tokio::test]
async fn test_scan_accessible_fixture() {
    let snapshot = scan_path(&fixture("accessible.html")).await;

    assert!(
        !snapshot.has_high_severity(),
        "Accessible fixture should have no high-severity findings, got {:?}",
        snapshot.by_severity(Severity::High)
    );
    assert!(snapshot.by_severity(Severity::Medium).is_empty());
    assert_eq!(snapshot.by_criterion(Criterion::Heading).len(), 2);
}

#[tokio::test]
async fn test_scan_inaccessible_fixture() {
    let snapshot = scan_path(&fixture("inaccessible.html")).await;

    assert_eq!(snapshot.by_criterion(Criterion::Contrast).len(), 1);
    assert_eq!(snapshot.by_criterion(Criterion::FocusIndicator).len(), 2);
    assert_eq!(snapshot.by_criterion(Criterion::AltText).len(), 1);
    assert_eq!(snapshot.by_criterion(Criterion::Landmark).len(), 4);
    assert_eq!(snapshot.by_criterion(Criterion::Heading).len(), 1);
    assert!(snapshot.has_high_severity());

    let contrast = snapshot.by_criterion(Criterion::Contrast)[0];
    assert!(contrast.line_number.is_some());
    assert!(contrast
        .snippet
        .as_deref()
        .unwrap_or_default()
        .contains("<p class=\"faint\">"));

    let alt = snapshot.by_criterion(Criterion::AltText)[0];
    assert!(alt.details.ends_with("tests/fixtures/images/chart.png\""));

    let heading = snapshot.by_criterion(Criterion::Heading)[0];
    assert_eq!(heading.details, "Level: H3, text: \"Skipped levels\"");
}

#[tokio::test]
async fn test_findings_point_into_snapshot_html() {
    let snapshot = scan_path(&fixture("inaccessible.html")).await;
    let lines: Vec<&str> = snapshot.html.lines().collect();

    for finding in &snapshot.findings {
        if let (Some(line), Some(snippet)) = (finding.line_number, &finding.snippet) {
            assert_eq!(lines[line - 1].trim(), snippet);
        }
    }
}

#[tokio::test]
async fn test_end_to_end_fix_resolves_issues() {
    let snapshot = scan_path(&fixture("end_to_end.html")).await;
    let contrast = snapshot.by_criterion(Criterion::Contrast);
    assert_eq!(contrast.len(), 1);
    assert_eq!(contrast[0].details, "Contrast ratio 1.00:1");
    assert_eq!(contrast[0].severity(), Severity::High);
    let alt = snapshot.by_criterion(Criterion::AltText);
    assert_eq!(alt.len(), 1);
    assert_eq!(alt[0].severity(), Severity::High);
    let landmarks = snapshot.by_criterion(Criterion::Landmark);
    assert_eq!(landmarks.len(), 4);
    assert!(landmarks.iter().all(|f| f.severity() == Severity::Medium));
    assert!(snapshot.by_criterion(Criterion::Heading).is_empty());
    assert_eq!(snapshot.len(), 6);

    let fixed = apply_fixes(&snapshot, &FixConfig::default()).expect("fix should succeed");
    assert!(fixed.contains("color:#000 !important; background-color:#fff !important"));
    assert!(fixed.contains("alt=\"Description added for accessibility\""));
    assert!(fixed.contains("<header><h1>Header</h1></header>"));
    assert!(fixed.contains("<footer>Footer Info</footer>"));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixed.html");
    std::fs::write(&path, &fixed).unwrap();

    let rescanned = scan_path(&path).await;
    assert!(rescanned.by_criterion(Criterion::Contrast).is_empty());
    assert!(rescanned.by_criterion(Criterion::AltText).is_empty());
    assert!(rescanned.by_criterion(Criterion::Landmark).is_empty());
}

#[tokio::test]
async fn test_external_stylesheet_is_checked() {
    let dir = TempDir::new().unwrap();
    let snapshot = scan_path(&linked_stylesheet_page(&dir)).await;

    let contrast = snapshot.by_criterion(Criterion::Contrast);
    assert_eq!(contrast.len(), 1);
    assert!(contrast[0]
        .selector
        .as_deref()
        .is_some_and(|s| s.ends_with("p:nth-of-type(1)")));
    assert_eq!(snapshot.by_criterion(Criterion::FocusIndicator).len(), 1);
}

#[tokio::test]
async fn test_custom_property_and_hsl_colors_are_checked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("themed.html");
    std::fs::write(
        &path,
        r#"<html><head><style>:root { --fg: #eee } p { color: var(--fg) } span { color: hsl(0, 0%, 93%) }</style></head>
<body><p>Themed</p><span>Light</span></body></html>"#,
    )
    .unwrap();

    let snapshot = scan_path(&path).await;
    assert_eq!(snapshot.by_criterion(Criterion::Contrast).len(), 2);
}

#[tokio::test]
#[ignore] // Needs Chrome - run with --ignored
async fn test_browser_renderer_reads_computed_styles() {
    let dir = TempDir::new().unwrap();
    let renderer = BrowserRenderer::new(&Config::default().render);
    let snapshot = scan_with(&linked_stylesheet_page(&dir), &renderer).await;

    assert_eq!(snapshot.by_criterion(Criterion::Contrast).len(), 1);
    assert_eq!(snapshot.by_criterion(Criterion::FocusIndicator).len(), 1);
    assert!(snapshot.html.contains("<p>Hard to read</p>"));
}

#[tokio::test]
async fn test_saved_snapshot_round_trip() {
    let snapshot = scan_path(&fixture("inaccessible.html")).await;
    let json = snapshot.to_json().unwrap();
    let restored = ScanSnapshot::from_json(&json).unwrap();

    assert_eq!(restored, snapshot);
    assert_eq!(
        apply_fixes(&restored, &FixConfig::default()).unwrap(),
        apply_fixes(&snapshot, &FixConfig::default()).unwrap()
    );
}

#[tokio::test]
async fn test_store_holds_latest_scan() {
    let store = SnapshotStore::new();
    store.publish(scan_path(&fixture("accessible.html")).await).await;
    store.publish(scan_path(&fixture("inaccessible.html")).await).await;

    let latest = store.latest().await.expect("snapshot published");
    assert!(latest.url.ends_with("inaccessible.html"));

    let html = store.apply_fixes(&FixConfig::default()).await.unwrap();
    assert!(html.contains("outline:3px solid #005fcc;"));
}

#[tokio::test]
async fn test_reports_for_fixture() {
    let snapshot = scan_path(&fixture("inaccessible.html")).await;

    let text = generate_report(&snapshot, OutputFormat::Text);
    assert!(text.contains("RESULT: FAIL"));

    let json: serde_json::Value =
        serde_json::from_str(&generate_report(&snapshot, OutputFormat::Json)).expect("valid JSON");
    assert_eq!(json["findings"].as_array().map(|f| f.len()), Some(snapshot.len()));

    let sarif: serde_json::Value =
        serde_json::from_str(&generate_report(&snapshot, OutputFormat::Sarif)).expect("valid JSON");
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(
        sarif["runs"][0]["results"].as_array().map(|r| r.len()),
        Some(snapshot.len())
    );
}

#[tokio::test]
async fn test_missing_page_is_render_error() {
    let config = Config::default();
    let renderer = StaticRenderer::new(&config.render).unwrap();
    let err = scanner::scan("/nonexistent/wcagbot/page.html", &renderer, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, wcagbot::Error::Render(_)));
}
