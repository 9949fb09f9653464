// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text check - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Every `<img>` whose `alt` attribute is missing or blank is reported,
//! with its `src` resolved against the page URL.

use crate::analyzers::selector::build_selector;
use crate::analyzers::Check;
use crate::findings::{AltTextRecord, RawFindings};
use crate::render::RenderedDocument;

/// Alt text check
pub struct AltTextCheck;

impl Check for AltTextCheck {
    fn name(&self) -> &str {
        "Alt Text"
    }

    fn description(&self) -> &str {
        "Checks <img> elements have non-empty alt text (WCAG 1.1.1)"
    }

    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings) {
        let dom = document.dom();
        for id in dom.find_all("img") {
            let has_alt = dom
                .attr(id, "alt")
                .map(|alt| !alt.trim().is_empty())
                .unwrap_or(false);
            if has_alt {
                continue;
            }
            let image_src = dom
                .attr(id, "src")
                .map(|src| document.resolve_url(src.trim()))
                .unwrap_or_default();
            findings.alt_issues.push(AltTextRecord {
                selector: build_selector(dom, id),
                image_src,
                message: "Missing alt attribute".to_string(),
                suggestion: "Add descriptive alt text per WCAG 1.1.1.".to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_missing_and_blank_alt() {
        let base = Url::parse("https://example.com/blog/post.html").unwrap();
        let doc = RenderedDocument::from_html(
            r#"<body>
<img src="a.png">
<img src="b.png" alt="   ">
<img src="c.png" alt="">
<img src="d.png" alt="A red bicycle">
</body>"#,
            Some(base),
        );
        let mut findings = RawFindings::new();
        AltTextCheck.run(&doc, &mut findings);

        let srcs: Vec<&str> = findings.alt_issues.iter().map(|a| a.image_src.as_str()).collect();
        assert_eq!(
            srcs,
            vec![
                "https://example.com/blog/a.png",
                "https://example.com/blog/b.png",
                "https://example.com/blog/c.png",
            ]
        );
        assert!(findings.alt_issues[1].selector.ends_with("img:nth-of-type(2)"));
    }

    #[test]
    fn test_only_image_without_alt_is_reported() {
        let doc = RenderedDocument::from_html(r#"<body><img src="a.png"><img src="cat.png" alt="cat"></body>"#, None);
        let mut findings = RawFindings::new();
        AltTextCheck.run(&doc, &mut findings);
        assert_eq!(findings.alt_issues.len(), 1);
        assert!(findings.alt_issues[0].selector.ends_with("img:nth-of-type(1)"));
    }

    #[test]
    fn test_image_without_src() {
        let doc = RenderedDocument::from_html("<img>", None);
        let mut findings = RawFindings::new();
        AltTextCheck.run(&doc, &mut findings);
        assert_eq!(findings.alt_issues.len(), 1);
        assert_eq!(findings.alt_issues[0].image_src, "");
    }
}
