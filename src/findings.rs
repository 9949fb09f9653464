// SPDX-License-Identifier: PMPL-1.0-or-later
//! Finding types.
//!
//! Checks emit check-specific raw records collected in [`RawFindings`]. The
//! normalizer turns those into [`NormalizedFinding`]s, whose severity is a
//! fixed function of their [`Criterion`]. A [`ScanSnapshot`] bundles the
//! normalized findings with the rendered HTML they refer to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Heading found on the page (informational)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingRecord {
    /// Upper-case tag name, as the DOM reports it (`H1`..`H6`)
    pub tag: String,
    pub text: String,
    pub font_size: String,
    pub selector: String,
}

/// Text whose contrast against its background is too low
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastRecord {
    pub selector: String,
    pub ratio: f64,
    pub message: String,
    pub suggestion: String,
}

/// Interactive element without a visible focus outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub selector: String,
    pub tag: String,
    pub message: String,
    pub suggestion: String,
}

/// Image without alternative text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltTextRecord {
    pub selector: String,
    pub image_src: String,
    pub message: String,
    pub suggestion: String,
}

/// Landmark region missing from the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub missing_tag: String,
    pub missing_role: String,
    pub message: String,
    pub suggestion: String,
}

/// Everything the checks found on one page, grouped by check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFindings {
    pub headings: Vec<HeadingRecord>,
    pub contrast_issues: Vec<ContrastRecord>,
    pub keyboard_issues: Vec<FocusRecord>,
    pub alt_issues: Vec<AltTextRecord>,
    pub landmark_issues: Vec<LandmarkRecord>,
}

impl RawFindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all checks
    pub fn len(&self) -> usize {
        self.headings.len()
            + self.contrast_issues.len()
            + self.keyboard_issues.len()
            + self.alt_issues.len()
            + self.landmark_issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Severity of a normalized finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// WCAG criterion a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    #[serde(rename = "1.4.3 Contrast")]
    Contrast,
    #[serde(rename = "2.4.7 Focus Indicator")]
    FocusIndicator,
    #[serde(rename = "1.1.1 Alt Text")]
    AltText,
    #[serde(rename = "ARIA Landmarks")]
    Landmark,
    #[serde(rename = "2.4.6 Headings")]
    Heading,
}

impl Criterion {
    /// Severity is fixed per criterion
    pub fn severity(&self) -> Severity {
        match self {
            Criterion::Contrast | Criterion::AltText => Severity::High,
            Criterion::FocusIndicator | Criterion::Landmark => Severity::Medium,
            Criterion::Heading => Severity::Low,
        }
    }

    /// WCAG success criterion number
    pub fn wcag_ref(&self) -> &'static str {
        match self {
            Criterion::Contrast => "1.4.3",
            Criterion::FocusIndicator => "2.4.7",
            Criterion::AltText => "1.1.1",
            Criterion::Landmark => "1.3.1",
            Criterion::Heading => "2.4.6",
        }
    }

    /// Stable rule identifier used in SARIF output
    pub fn rule_id(&self) -> &'static str {
        match self {
            Criterion::Contrast => "WCAG-1.4.3-contrast",
            Criterion::FocusIndicator => "WCAG-2.4.7-focus-visible",
            Criterion::AltText => "WCAG-1.1.1-missing-alt",
            Criterion::Landmark => "WCAG-1.3.1-landmarks",
            Criterion::Heading => "WCAG-2.4.6-headings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Contrast => "1.4.3 Contrast",
            Criterion::FocusIndicator => "2.4.7 Focus Indicator",
            Criterion::AltText => "1.1.1 Alt Text",
            Criterion::Landmark => "ARIA Landmarks",
            Criterion::Heading => "2.4.6 Headings",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A finding in the uniform output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredFinding")]
pub struct NormalizedFinding {
    /// Unique identifier
    pub id: Uuid,
    pub criterion: Criterion,
    severity: Severity,
    /// Human-readable description
    pub details: String,
    /// Structural locator of the offending element (none for landmarks)
    pub selector: Option<String>,
    /// Line in the captured HTML (1-indexed)
    pub line_number: Option<usize>,
    /// Source line the element was found on
    pub snippet: Option<String>,
    /// Suggested fix
    pub recommendation: String,
}

impl NormalizedFinding {
    /// Create a new finding
    pub fn new(criterion: Criterion, details: &str, recommendation: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            criterion,
            severity: criterion.severity(),
            details: details.to_string(),
            selector: None,
            line_number: None,
            snippet: None,
            recommendation: recommendation.to_string(),
        }
    }

    /// Set the selector
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Location string for display
    pub fn location_string(&self) -> String {
        match (&self.selector, self.line_number) {
            (Some(s), Some(l)) => format!("{} (line {})", s, l),
            (Some(s), None) => s.clone(),
            (None, _) => "<document>".to_string(),
        }
    }
}

/// Deserialization shape of [`NormalizedFinding`]; any stored severity is
/// ignored and recomputed from the criterion.
#[derive(Deserialize)]
struct StoredFinding {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    criterion: Criterion,
    details: String,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    line_number: Option<usize>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    recommendation: String,
}

impl From<StoredFinding> for NormalizedFinding {
    fn from(stored: StoredFinding) -> Self {
        Self {
            id: stored.id,
            criterion: stored.criterion,
            severity: stored.criterion.severity(),
            details: stored.details,
            selector: stored.selector,
            line_number: stored.line_number,
            snippet: stored.snippet,
            recommendation: stored.recommendation,
        }
    }
}

/// Result of one scan: the rendered HTML and what was found in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub url: String,
    pub html: String,
    pub findings: Vec<NormalizedFinding>,
    #[serde(default = "Utc::now")]
    pub scanned_at: DateTime<Utc>,
}

impl ScanSnapshot {
    pub fn new(url: &str, html: String, findings: Vec<NormalizedFinding>) -> Self {
        Self {
            url: url.to_string(),
            html,
            findings,
            scanned_at: Utc::now(),
        }
    }

    /// Load a snapshot saved with [`ScanSnapshot::to_json`]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line summary of the scan
    pub fn summary(&self) -> String {
        format!("Analyzed {}; {} issues found.", self.url, self.findings.len())
    }

    /// Get findings by criterion
    pub fn by_criterion(&self, criterion: Criterion) -> Vec<&NormalizedFinding> {
        self.findings.iter().filter(|f| f.criterion == criterion).collect()
    }

    /// Get findings by severity
    pub fn by_severity(&self, severity: Severity) -> Vec<&NormalizedFinding> {
        self.findings.iter().filter(|f| f.severity() == severity).collect()
    }

    /// Whether any high-severity finding exists
    pub fn has_high_severity(&self) -> bool {
        self.findings.iter().any(|f| f.severity() == Severity::High)
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_criterion() {
        assert_eq!(Criterion::Contrast.severity(), Severity::High);
        assert_eq!(Criterion::AltText.severity(), Severity::High);
        assert_eq!(Criterion::FocusIndicator.severity(), Severity::Medium);
        assert_eq!(Criterion::Landmark.severity(), Severity::Medium);
        assert_eq!(Criterion::Heading.severity(), Severity::Low);
    }

    #[test]
    fn test_deserialize_recomputes_severity() {
        let json = r#"{
            "criterion": "2.4.6 Headings",
            "severity": "high",
            "details": "Level: H1, text: \"Hi\"",
            "selector": "h1:nth-of-type(1)",
            "recommendation": "Use sequential heading levels."
        }"#;
        let finding: NormalizedFinding = serde_json::from_str(json).unwrap();
        assert_eq!(finding.criterion, Criterion::Heading);
        assert_eq!(finding.severity(), Severity::Low);
        assert_eq!(finding.line_number, None);
    }

    #[test]
    fn test_serialized_labels() {
        let finding = NormalizedFinding::new(Criterion::Contrast, "Contrast ratio 1.00:1", "fix");
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["criterion"], "1.4.3 Contrast");
        assert_eq!(value["severity"], "high");
    }

    #[test]
    fn test_snapshot_summary() {
        let snapshot = ScanSnapshot::new(
            "https://example.com",
            String::new(),
            vec![NormalizedFinding::new(Criterion::Landmark, "Missing <nav>", "Add nav")],
        );
        assert_eq!(snapshot.summary(), "Analyzed https://example.com; 1 issues found.");
        assert!(!snapshot.has_high_severity());
        assert_eq!(snapshot.by_severity(Severity::Medium).len(), 1);
    }
}
