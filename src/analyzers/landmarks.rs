// SPDX-License-Identifier: PMPL-1.0-or-later
//! Landmark region check - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! A page should expose banner, navigation, main and contentinfo regions,
//! either through the HTML5 element or an explicit `role`.

use crate::analyzers::Check;
use crate::dom::Document;
use crate::findings::{LandmarkRecord, RawFindings};
use crate::render::RenderedDocument;

/// Landmark elements and their equivalent ARIA roles, in check order
pub const LANDMARKS: [(&str, &str); 4] = [
    ("header", "banner"),
    ("nav", "navigation"),
    ("main", "main"),
    ("footer", "contentinfo"),
];

/// Landmark check
pub struct LandmarkCheck;

/// Whether the document has the landmark as an element or a role
pub fn has_landmark(dom: &Document, tag: &str, role: &str) -> bool {
    dom.elements().into_iter().any(|id| {
        dom.tag(id) == Some(tag)
            || dom
                .attr(id, "role")
                .map(|r| r.trim() == role)
                .unwrap_or(false)
    })
}

impl Check for LandmarkCheck {
    fn name(&self) -> &str {
        "Landmarks"
    }

    fn description(&self) -> &str {
        "Checks for header, nav, main and footer regions (ARIA landmarks)"
    }

    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings) {
        let dom = document.dom();
        for (tag, role) in LANDMARKS {
            if has_landmark(dom, tag, role) {
                continue;
            }
            findings.landmark_issues.push(LandmarkRecord {
                missing_tag: tag.to_string(),
                missing_role: role.to_string(),
                message: format!("Missing <{}> or role=\"{}\"", tag, role),
                suggestion: format!("Include <{}> or set role=\"{}\".", tag, role),
            });
        }
    }
}
