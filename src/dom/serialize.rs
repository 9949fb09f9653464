// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTML serialization for the arena DOM, following the HTML fragment
//! serialization rules browsers use for `outerHTML`.

use super::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Serialize an element's opening tag, e.g. `<img src="a.png" alt="">`
pub fn start_tag<'a>(name: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape(value, true, &mut out);
        out.push('"');
    }
    out.push('>');
    out
}

pub(super) fn write_node(document: &Document, id: NodeId, out: &mut String) {
    let node = document.node(id);
    match &node.data {
        NodeData::Document => {
            for child in &node.children {
                write_node(document, *child, out);
            }
        }
        NodeData::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            let raw = document
                .parent(id)
                .and_then(|p| document.tag(p))
                .map(|tag| RAW_TEXT_ELEMENTS.contains(&tag))
                .unwrap_or(false);
            if raw {
                out.push_str(text);
            } else {
                escape(text, false, out);
            }
        }
        NodeData::Element(element) => {
            out.push_str(&start_tag(
                &element.name,
                element.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ));
            if VOID_ELEMENTS.contains(&element.name.as_str()) {
                return;
            }
            for child in &node.children {
                write_node(document, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn escape(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_tag() {
        assert_eq!(start_tag("p", []), "<p>");
        assert_eq!(
            start_tag("img", [("src", "a.png"), ("alt", "x & \"y\"")]),
            "<img src=\"a.png\" alt=\"x &amp; &quot;y&quot;\">"
        );
    }

    #[test]
    fn test_text_escaping() {
        let doc = Document::parse("<p>a &lt; b &amp; c</p><script>if (a < b) {}</script>");
        let html = doc.to_html();
        assert!(html.contains("<p>a &lt; b &amp; c</p>"));
        assert!(html.contains("<script>if (a < b) {}</script>"));
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let doc = Document::parse("<p>line<br>next</p>");
        assert!(doc.to_html().contains("<p>line<br>next</p>"));
    }
}
