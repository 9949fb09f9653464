// SPDX-License-Identifier: PMPL-1.0-or-later
//! Findings normalization.
//!
//! Raw check records are mapped onto [`NormalizedFinding`]s in a fixed
//! order: contrast, focus, alt text, landmarks, headings. Findings can then
//! be enriched with the line and source snippet of the element they point
//! at; enrichment is best effort and never fails.

use crate::dom::{start_tag, Document, QueryIndex};
use crate::findings::{Criterion, NormalizedFinding, RawFindings};
use tracing::debug;

/// Map raw records to normalized findings
pub fn normalize(raw: &RawFindings) -> Vec<NormalizedFinding> {
    let mut findings = Vec::with_capacity(raw.len());

    for c in &raw.contrast_issues {
        findings.push(
            NormalizedFinding::new(
                Criterion::Contrast,
                &format!("Contrast ratio {:.2}:1", c.ratio),
                &c.suggestion,
            )
            .with_selector(&c.selector),
        );
    }

    for k in &raw.keyboard_issues {
        findings.push(
            NormalizedFinding::new(Criterion::FocusIndicator, &k.tag, &k.suggestion)
                .with_selector(&k.selector),
        );
    }

    for a in &raw.alt_issues {
        findings.push(
            NormalizedFinding::new(
                Criterion::AltText,
                &format!("Image src=\"{}\"", a.image_src),
                &a.suggestion,
            )
            .with_selector(&a.selector),
        );
    }

    for l in &raw.landmark_issues {
        findings.push(NormalizedFinding::new(Criterion::Landmark, &l.message, &l.suggestion));
    }

    for h in &raw.headings {
        findings.push(
            NormalizedFinding::new(
                Criterion::Heading,
                &format!("Level: {}, text: \"{}\"", h.tag, h.text),
                "Use sequential heading levels.",
            )
            .with_selector(&h.selector),
        );
    }

    findings
}

/// Resolves selectors to source lines of one HTML document
pub struct Locator<'a> {
    lines: Vec<&'a str>,
    dom: Document,
    index: QueryIndex,
}

impl<'a> Locator<'a> {
    pub fn new(html: &'a str) -> Self {
        let (dom, index) = Document::parse_with_index(html);
        Self {
            lines: html.lines().collect(),
            dom,
            index,
        }
    }

    /// Line number (1-based) and trimmed source line of the first element
    /// matching `selector`
    pub fn locate(&self, selector: &str, max_len: usize) -> (Option<usize>, Option<String>) {
        let id = match self.index.select(selector) {
            Ok(found) => match found.first() {
                Some(id) => *id,
                None => return (None, None),
            },
            Err(e) => {
                debug!("Cannot locate {:?}: {}", selector, e);
                return (None, None);
            }
        };
        let Some(element) = self.dom.element(id) else {
            return (None, None);
        };
        let opening = start_tag(
            &element.name,
            element.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );

        self.lines
            .iter()
            .position(|line| line.contains(&opening))
            .map(|idx| {
                let snippet: String = self.lines[idx].trim().chars().take(max_len).collect();
                (Some(idx + 1), Some(snippet))
            })
            .unwrap_or((None, None))
    }
}

/// Locate a single selector in `html`
pub fn locate(html: &str, selector: &str, max_len: usize) -> (Option<usize>, Option<String>) {
    Locator::new(html).locate(selector, max_len)
}

/// Attach line numbers and snippets to findings that carry a selector
pub fn enrich(findings: &mut [NormalizedFinding], html: &str, max_len: usize) {
    if html.is_empty() || findings.iter().all(|f| f.selector.is_none()) {
        return;
    }
    let locator = Locator::new(html);
    for finding in findings.iter_mut() {
        if let Some(selector) = &finding.selector {
            let (line, snippet) = locator.locate(selector, max_len);
            finding.line_number = line;
            finding.snippet = snippet;
        }
    }
}
