// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for scan snapshots.
//!
//! Supports multiple output formats:
//! - Text: human-readable findings grouped by severity
//! - JSON: summary plus the normalized findings
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use crate::findings::{ScanSnapshot, Severity};
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report for a snapshot
pub fn generate_report(snapshot: &ScanSnapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(snapshot),
        OutputFormat::Json => generate_json_report(snapshot),
        OutputFormat::Sarif => generate_sarif_report(snapshot),
    }
}

fn generate_text_report(snapshot: &ScanSnapshot) -> String {
    let mut output = String::new();

    output.push_str("=== wcagbot WCAG 2.1 AA Report ===\n\n");
    output.push_str(&format!("{}\n", snapshot.summary()));
    output.push_str(&format!("Scanned at: {}\n\n", snapshot.scanned_at.to_rfc3339()));

    if snapshot.is_empty() {
        output.push_str("No accessibility issues found. All checks passed.\n");
        return output;
    }

    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        let findings = snapshot.by_severity(severity);
        if findings.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity, findings.len()));

        for finding in findings {
            output.push_str(&format!("[{}] {}\n", finding.criterion, finding.details));
            output.push_str(&format!("  Location: {}\n", finding.location_string()));
            if let Some(ref snippet) = finding.snippet {
                output.push_str(&format!("  Source: {}\n", snippet));
            }
            output.push_str(&format!("  Fix: {}\n\n", finding.recommendation));
        }
    }

    if snapshot.has_high_severity() {
        output.push_str("RESULT: FAIL (high-severity issues found)\n");
    } else {
        output.push_str("RESULT: PASS WITH WARNINGS\n");
    }

    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: String,
    url: &'a str,
    scanned_at: String,
    findings: &'a [crate::findings::NormalizedFinding],
}

fn generate_json_report(snapshot: &ScanSnapshot) -> String {
    let report = JsonReport {
        summary: snapshot.summary(),
        url: &snapshot.url,
        scanned_at: snapshot.scanned_at.to_rfc3339(),
        findings: &snapshot.findings,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize findings: {}\"}}", e)
    })
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations", skip_serializing_if = "Vec::is_empty")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    snippet: Option<SarifMessage>,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
}

fn generate_sarif_report(snapshot: &ScanSnapshot) -> String {
    let results: Vec<SarifResult> = snapshot
        .findings
        .iter()
        .map(|f| {
            let level = match f.severity() {
                Severity::High => "error",
                Severity::Medium => "warning",
                Severity::Low => "note",
            };

            let location = SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: snapshot.url.clone(),
                    },
                    region: f.line_number.map(|l| SarifRegion {
                        start_line: l,
                        snippet: f.snippet.clone().map(|text| SarifMessage { text }),
                    }),
                },
                logical_locations: f
                    .selector
                    .iter()
                    .map(|s| SarifLogicalLocation {
                        fully_qualified_name: s.clone(),
                    })
                    .collect(),
            };

            SarifResult {
                rule_id: f.criterion.rule_id().to_string(),
                level: level.to_string(),
                message: SarifMessage {
                    text: format!("{}: {}. {}", f.criterion, f.details, f.recommendation),
                },
                locations: vec![location],
            }
        })
        .collect();

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "wcagbot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e)
    })
}
