// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page rendering.
//!
//! A [`Renderer`] turns a URL into a [`RenderedPage`]: an immutable
//! [`RenderedDocument`] (DOM plus computed style per element) and the
//! serialized HTML of that DOM. Checks only ever see the snapshot, so no
//! browser state leaks into or out of the analysis.
//!
//! [`BrowserRenderer`] reads computed styles from headless Chrome.
//! [`StaticRenderer`] resolves them with the built-in cascade and needs no
//! browser.

mod browser;
mod fetch;
pub mod style;

pub use browser::BrowserRenderer;
pub use fetch::StaticRenderer;

use crate::dom::{Document, NodeData, NodeId};
use crate::error::Result;
use async_trait::async_trait;
use url::Url;

/// Interactive elements; these get a focused style in the snapshot
pub const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select"];

/// Resolved style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    /// Foreground color as declared or inherited (e.g. `rgb(0, 0, 0)`, `#333`)
    pub color: String,
    /// Background color; `rgba(0, 0, 0, 0)` when transparent
    pub background_color: String,
    /// Outline as `<style> <width>`, e.g. `solid 3px` or `none 0px`
    pub outline: String,
    /// Font size in pixels, e.g. `16px`
    pub font_size: String,
    /// `display` value; `none` hides the element and its subtree
    pub display: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            outline: "none 0px".to_string(),
            font_size: "16px".to_string(),
            display: "inline".to_string(),
        }
    }
}

/// Normal and focused style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementStyle {
    pub normal: ComputedStyle,
    /// Style while the element holds focus; only set for interactive elements
    pub focused: Option<ComputedStyle>,
}

/// A fully loaded page: DOM arena plus computed styles
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    dom: Document,
    styles: Vec<Option<ElementStyle>>,
    base_url: Option<Url>,
}

impl RenderedDocument {
    /// Assemble a document from a DOM and a style table indexed by `NodeId`
    pub fn new(dom: Document, styles: Vec<Option<ElementStyle>>, base_url: Option<Url>) -> Self {
        Self {
            dom,
            styles,
            base_url,
        }
    }

    /// Parse HTML and resolve styles with the built-in cascade
    pub fn from_html(source: &str, base_url: Option<Url>) -> Self {
        style::render_document(source, base_url)
    }

    pub fn dom(&self) -> &Document {
        &self.dom
    }

    /// Computed style of an element
    pub fn style(&self, id: NodeId) -> Option<&ComputedStyle> {
        self.styles
            .get(id.index())
            .and_then(|s| s.as_ref())
            .map(|s| &s.normal)
    }

    /// Computed style of an element while focused
    pub fn focused_style(&self, id: NodeId) -> Option<&ComputedStyle> {
        self.styles
            .get(id.index())
            .and_then(|s| s.as_ref())
            .and_then(|s| s.focused.as_ref().or(Some(&s.normal)))
    }

    /// Whether the element and all of its ancestors are displayed
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(style) = self.style(node) {
                if style.display == "none" {
                    return false;
                }
            }
            current = self.dom.parent_element(node);
        }
        true
    }

    /// Rendered text of an element with whitespace collapsed, skipping
    /// hidden subtrees (an approximation of `innerText`)
    pub fn inner_text(&self, id: NodeId) -> String {
        if !self.is_rendered(id) {
            return String::new();
        }
        let mut words: Vec<&str> = Vec::new();
        let mut stack: Vec<NodeId> = self.dom.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            match &self.dom.node(next).data {
                NodeData::Text(text) => words.extend(text.split_whitespace()),
                NodeData::Element(_) => {
                    let hidden = self.style(next).map(|s| s.display == "none").unwrap_or(false);
                    if !hidden {
                        stack.extend(self.dom.node(next).children.iter().rev().copied());
                    }
                }
                _ => {}
            }
        }
        words.join(" ")
    }

    /// Resolve a possibly relative URL against the page URL
    pub fn resolve_url(&self, value: &str) -> String {
        self.base_url
            .as_ref()
            .and_then(|base| base.join(value).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| value.to_string())
    }
}

/// Output of a render: the analysable document and its serialized HTML
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: Url,
    pub document: RenderedDocument,
    pub html: String,
}

impl RenderedPage {
    /// Wrap a rendered document, serializing its DOM as the page HTML
    pub fn new(url: Url, document: RenderedDocument) -> Self {
        let html = document.dom().to_html();
        Self {
            url,
            document,
            html,
        }
    }

    /// Build a page from raw HTML with the built-in cascade
    pub fn from_source(url: Url, source: &str) -> Self {
        let document = RenderedDocument::from_html(source, Some(url.clone()));
        Self::new(url, document)
    }
}

/// Produces rendered pages for URLs
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate to `url` and capture the loaded DOM
    async fn render(&self, url: &Url) -> Result<RenderedPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_text_skips_hidden() {
        let doc = RenderedDocument::from_html(
            "<div>Visible <span style=\"display:none\">secret</span>  text\n here</div>",
            None,
        );
        let div = doc.dom().find_first("div").unwrap();
        assert_eq!(doc.inner_text(div), "Visible text here");
    }

    #[test]
    fn test_head_is_not_rendered() {
        let doc = RenderedDocument::from_html("<html><head><title>T</title></head><body></body></html>", None);
        let title = doc.dom().find_first("title").unwrap();
        assert!(!doc.is_rendered(title));
        assert_eq!(doc.inner_text(title), "");
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/dir/page.html").unwrap();
        let doc = RenderedDocument::from_html("<p>x</p>", Some(base));
        assert_eq!(doc.resolve_url("img/cat.png"), "https://example.com/dir/img/cat.png");
    }

    #[test]
    fn test_focused_style_falls_back_to_normal() {
        let doc = RenderedDocument::from_html("<p>x</p>", None);
        let p = doc.dom().find_first("p").unwrap();
        assert_eq!(doc.focused_style(p), doc.style(p));
    }
}
