// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility checks over a rendered page.
//!
//! Each check module covers one WCAG criterion. Checks read an immutable
//! [`RenderedDocument`] and append raw records to a [`RawFindings`] bundle;
//! they never mutate the page and never fail, so one bad element cannot
//! abort the scan.

pub mod alt_text;
pub mod contrast;
pub mod headings;
pub mod keyboard;
pub mod landmarks;
pub mod selector;

use crate::config::AnalysisConfig;
use crate::findings::RawFindings;
use crate::render::RenderedDocument;
use tracing::debug;

/// Trait implemented by all checks
pub trait Check: Send + Sync {
    /// Human-readable name of this check
    fn name(&self) -> &str;

    /// Short description of what this check looks for
    fn description(&self) -> &str;

    /// Inspect the document and record what was found
    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings);
}

/// Run every check against a document
pub fn scan_document(document: &RenderedDocument, config: &AnalysisConfig) -> RawFindings {
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(headings::HeadingCheck),
        Box::new(contrast::ContrastCheck::new(config.min_contrast_ratio)),
        Box::new(keyboard::FocusCheck),
        Box::new(alt_text::AltTextCheck),
        Box::new(landmarks::LandmarkCheck),
    ];

    let mut findings = RawFindings::new();
    for check in &checks {
        let before = findings.len();
        check.run(document, &mut findings);
        debug!("{}: {} records", check.name(), findings.len() - before);
    }
    findings
}
