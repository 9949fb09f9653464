// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural locators for elements.
//!
//! A locator is up to five `tag:nth-of-type(k)` segments, outermost first,
//! joined with `" > "`. Deep elements get a locator rooted below `html`, so
//! it is not guaranteed to be unique in the document.

use crate::dom::{Document, NodeId};

/// Maximum number of segments in a locator
pub const MAX_DEPTH: usize = 5;

/// Build the locator for an element
pub fn build_selector(dom: &Document, id: NodeId) -> String {
    let mut segments = Vec::with_capacity(MAX_DEPTH);
    let mut current = Some(id);

    while let Some(node) = current {
        if segments.len() == MAX_DEPTH {
            break;
        }
        let Some(tag) = dom.tag(node) else {
            break;
        };
        segments.push(format!("{}:nth-of-type({})", tag, ordinal_of_type(dom, node, tag)));
        current = dom.parent_element(node);
    }

    segments.reverse();
    segments.join(" > ")
}

/// 1-based position of `id` among its parent's children with the same tag
fn ordinal_of_type(dom: &Document, id: NodeId, tag: &str) -> usize {
    let Some(parent) = dom.parent(id) else {
        return 1;
    };
    dom.element_children(parent)
        .filter(|c| dom.tag(*c) == Some(tag))
        .position(|c| c == id)
        .map(|p| p + 1)
        .unwrap_or(1)
}
