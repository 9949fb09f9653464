// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading inventory - WCAG 2.4.6 Headings and Labels (Level AA)
//!
//! Records every `h1`-`h6` with its text and computed font size. The check
//! makes no judgment; each heading becomes a low-severity finding so the
//! outline can be reviewed.

use crate::analyzers::selector::build_selector;
use crate::analyzers::Check;
use crate::findings::{HeadingRecord, RawFindings};
use crate::render::RenderedDocument;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Heading inventory check
pub struct HeadingCheck;

impl Check for HeadingCheck {
    fn name(&self) -> &str {
        "Headings"
    }

    fn description(&self) -> &str {
        "Lists h1-h6 elements with text and font size (WCAG 2.4.6)"
    }

    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings) {
        let dom = document.dom();
        for id in dom.elements() {
            let Some(tag) = dom.tag(id).filter(|t| HEADING_TAGS.contains(t)) else {
                continue;
            };
            let font_size = document
                .style(id)
                .map(|s| s.font_size.clone())
                .unwrap_or_default();
            findings.headings.push(HeadingRecord {
                tag: tag.to_ascii_uppercase(),
                text: document.inner_text(id),
                font_size,
                selector: build_selector(dom, id),
            });
        }
    }
}
