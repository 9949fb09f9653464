// SPDX-License-Identifier: PMPL-1.0-or-later
//! Focus indicator check - WCAG 2.4.7 Focus Visible (Level AA)
//!
//! Every interactive element is inspected in its focused state. An element
//! whose focused outline is missing, `none`/`hidden`, or zero width has no
//! visible focus indicator.

use crate::analyzers::selector::build_selector;
use crate::analyzers::Check;
use crate::findings::{FocusRecord, RawFindings};
use crate::render::{RenderedDocument, INTERACTIVE_TAGS};

const SUGGESTION: &str = "Add CSS :focus styles (e.g. outline:3px solid #005fcc).";

/// Focus indicator check
pub struct FocusCheck;

impl Check for FocusCheck {
    fn name(&self) -> &str {
        "Focus Indicator"
    }

    fn description(&self) -> &str {
        "Checks interactive elements show an outline when focused (WCAG 2.4.7)"
    }

    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings) {
        let dom = document.dom();
        for id in dom.elements() {
            let Some(tag) = dom.tag(id).filter(|t| INTERACTIVE_TAGS.contains(t)) else {
                continue;
            };
            let outline = document.focused_style(id).map(|s| s.outline.as_str());
            if !has_visible_outline(outline) {
                findings.keyboard_issues.push(FocusRecord {
                    selector: build_selector(dom, id),
                    tag: tag.to_ascii_uppercase(),
                    message: "No visible focus indicator".to_string(),
                    suggestion: SUGGESTION.to_string(),
                });
            }
        }
    }
}

/// Whether a computed outline (`<style> <width>`) would be drawn
pub fn has_visible_outline(outline: Option<&str>) -> bool {
    let Some(outline) = outline.map(str::trim).filter(|o| !o.is_empty()) else {
        return false;
    };
    let mut visible = true;
    for token in outline.split_whitespace() {
        if matches!(token, "none" | "hidden") || is_zero_length(token) {
            visible = false;
        }
    }
    visible
}

fn is_zero_length(token: &str) -> bool {
    let number = token.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    !number.is_empty() && number.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<FocusRecord> {
        let doc = RenderedDocument::from_html(html, None);
        let mut findings = RawFindings::new();
        FocusCheck.run(&doc, &mut findings);
        findings.keyboard_issues
    }

    #[test]
    fn test_outline_visibility() {
        assert!(has_visible_outline(Some("auto 1px")));
        assert!(has_visible_outline(Some("solid 3px")));
        assert!(!has_visible_outline(Some("none 0px")));
        assert!(!has_visible_outline(Some("solid 0px")));
        assert!(!has_visible_outline(Some("solid 0")));
        assert!(!has_visible_outline(Some("")));
        assert!(!has_visible_outline(None));
    }

    #[test]
    fn test_default_focus_ring_passes() {
        assert!(run(r#"<a href="/">Home</a><button>Go</button><input>"#).is_empty());
    }

    #[test]
    fn test_suppressed_focus_outline_is_reported() {
        let issues = run(
            r#"<style>a:focus { outline: none } button { outline: 0 }</style>
<a href="/">Home</a><button>Go</button><textarea></textarea>"#,
        );
        let tags: Vec<&str> = issues.iter().map(|i| i.tag.as_str()).collect();
        assert_eq!(tags, vec!["A", "BUTTON"]);
        assert!(issues[0].selector.ends_with("a:nth-of-type(1)"));
    }

    #[test]
    fn test_custom_focus_style_restores_indicator() {
        let issues = run(
            r#"<style>a { outline: none } a:focus-visible { outline: 3px solid #005fcc }</style><a href="/">Home</a>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_inline_outline_none() {
        let issues = run(r#"<select style="outline-style:none"><option>1</option></select>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].tag, "SELECT");
    }
}
