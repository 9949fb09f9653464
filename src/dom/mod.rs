// SPDX-License-Identifier: PMPL-1.0-or-later
//! Index-addressed DOM arena.
//!
//! Documents are parsed with `scraper` and copied into a flat `Vec<Node>`
//! where parent and child links are `NodeId` indices. The arena can be
//! queried, patched and serialized back to HTML without ownership cycles.
//!
//! Selector queries go through [`QueryIndex`], which keeps the `scraper`
//! document the arena was built from. Elements of both trees are aligned by
//! their pre-order position, so a match in the `scraper` tree maps straight
//! to a `NodeId`.

mod serialize;

pub use serialize::start_tag;

use scraper::{ElementRef, Html, Node as HtmlNode, Selector};
use tracing::warn;

/// Index of a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of this node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element's tag name and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-case local name
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn from_scraper(element: &scraper::node::Element) -> Self {
        Self {
            name: element.name().to_string(),
            attrs: element
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// A parsed HTML document stored as an arena of nodes
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    /// Parse a complete HTML document
    pub fn parse(source: &str) -> Self {
        Self::from_html(&Html::parse_document(source))
    }

    /// Parse a document and keep a selector index over it
    pub fn parse_with_index(source: &str) -> (Self, QueryIndex) {
        let html = Html::parse_document(source);
        let document = Self::from_html(&html);
        let index = QueryIndex::new(html, &document);
        (document, index)
    }

    /// Copy a `scraper` document into a new arena
    pub fn from_html(html: &Html) -> Self {
        let mut document = Self::new();
        let root = document.root();
        for child in html.tree.root().children() {
            if let Some(element) = ElementRef::wrap(child) {
                document.import_element(root, element);
            } else if let Some(data) = leaf_data(child.value()) {
                document.push_child(root, data);
            }
        }
        document
    }

    fn import_element(&mut self, parent: NodeId, element: ElementRef<'_>) -> NodeId {
        let id = self.push_child(
            parent,
            NodeData::Element(ElementData::from_scraper(element.value())),
        );
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(id, child_element);
            } else if let Some(data) = leaf_data(child.value()) {
                self.push_child(id, data);
            }
        }
        id
    }

    fn push_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.push_detached(data);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_detached(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Element payload of a node, if it is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Lower-case tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent node, if that parent is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.element(*p).is_some())
    }

    /// Element children of a node in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.element(*c).is_some())
    }

    /// All nodes below `id` in pre-order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// All elements attached to the document, in document order
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    /// All elements with the given tag name, in document order
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.tag(*id) == Some(tag))
            .collect()
    }

    /// First element with the given tag name
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag(*id) == Some(tag))
    }

    /// Set an attribute on an element; no-op on other nodes
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(data) = &mut self.nodes[id.0].data {
            data.set_attr(name, value);
        }
    }

    /// Parse an HTML fragment into detached nodes owned by this document
    pub fn create_fragment(&mut self, source: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(source);
        let holder = self.push_detached(NodeData::Document);
        for child in fragment.root_element().children() {
            if let Some(element) = ElementRef::wrap(child) {
                self.import_element(holder, element);
            } else if let Some(data) = leaf_data(child.value()) {
                self.push_child(holder, data);
            }
        }
        let nodes = std::mem::take(&mut self.nodes[holder.0].children);
        for node in &nodes {
            self.nodes[node.0].parent = None;
        }
        nodes
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Insert `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Insert `node` directly after `sibling`; no-op if `sibling` is detached
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        let Some(parent) = self.nodes[sibling.0].parent else {
            return;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|c| *c == sibling)
            .map(|p| p + 1)
            .unwrap_or(siblings.len());
        siblings.insert(pos, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[self.root().0].children {
            serialize::write_node(self, *child, &mut out);
        }
        out
    }
}

fn leaf_data(node: &HtmlNode) -> Option<NodeData> {
    match node {
        HtmlNode::Text(text) => Some(NodeData::Text(String::from(&**text))),
        HtmlNode::Comment(comment) => Some(NodeData::Comment(String::from(&**comment))),
        HtmlNode::Doctype(doctype) => Some(NodeData::Doctype(doctype.name().to_string())),
        _ => None,
    }
}

/// Selector lookups against the `scraper` document an arena was built from.
///
/// The index reflects the document as parsed; nodes inserted into the arena
/// afterwards are not visible to it.
pub struct QueryIndex {
    html: Html,
    order: Vec<NodeId>,
}

impl QueryIndex {
    fn new(html: Html, document: &Document) -> Self {
        let order = document.elements();
        let parsed = html.root_element().descendants().filter_map(ElementRef::wrap).count();
        if parsed != order.len() {
            warn!(
                "Selector index out of step with arena ({} parsed vs {} arena elements)",
                parsed,
                order.len()
            );
        }
        Self { html, order }
    }

    /// Resolve a CSS selector to arena nodes in document order
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, String> {
        let selector = Selector::parse(selector).map_err(|e| e.to_string())?;
        Ok(self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .zip(self.order.iter().copied())
            .filter(|(element, _)| selector.matches(element))
            .map(|(_, id)| id)
            .collect())
    }
}
