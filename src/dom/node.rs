//! Arena-backed DOM (Document Object Model)
//!
//! Nodes live in a single arena owned by the [`Document`] and are addressed
//! by [`NodeId`]. The arena only grows: detached nodes keep their slot, so a
//! stale id can never alias a newer node. Liveness is a question of whether
//! the node is still connected to the current root.

use super::html::HtmlParser;
use super::serialize;
use crate::utils::error::NetworkError;
use crate::utils::Result;
use std::collections::HashMap;
use url::Url;

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Node types in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Document root
    Document,
    /// Element node (e.g., <div>)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name, lowercase (e.g., "div", "span")
    pub tag_name: String,
    /// Element attributes in source order
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Whether this element has the given tag name
    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check whether an attribute is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Set an attribute value, replacing an existing one in place
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    /// Get the ID attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// A node in the DOM arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    /// Get element data if this is an element
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }
}

/// Axis-aligned box in client (viewport) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Top edge
    pub fn top(&self) -> f64 {
        self.y
    }
}

/// The DOM document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    url: Url,
    /// Layout boxes reported by the host; elements without one sit at the origin
    rects: HashMap<NodeId, Rect>,
    navigation: Option<Url>,
}

impl Document {
    /// Create a new empty document at `url`
    pub fn new(url: Url) -> Self {
        Self {
            nodes: vec![Node::new(NodeType::Document)],
            root: NodeId(0),
            url,
            rects: HashMap::new(),
            navigation: None,
        }
    }

    /// Parse a full HTML page served from `url`
    pub fn parse(url: Url, html: &str) -> Result<Self> {
        let mut document = Self::new(url);
        HtmlParser::new().parse_into(&mut document, html)?;
        Ok(document)
    }

    /// Root (document) node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Document URL, used as the base for every relative reference
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve a possibly relative reference against the document URL
    pub fn resolve(&self, reference: &str) -> Result<Url> {
        self.url
            .join(reference)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", reference, e)).into())
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get element data for a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(Node::as_element)
    }

    /// Get mutable element data for a node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id.0).and_then(Node::as_element_mut)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeType::Text(content.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeType::Comment(content.into()))
    }

    pub(crate) fn push(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node_type));
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() || parent == child {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove a node from its parent; the subtree stays in the arena
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    /// Replace `old` with `replacements`, in order, at the same position.
    ///
    /// Returns false (and changes nothing) when `old` is detached.
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        for node in replacements {
            self.detach(*node);
        }
        let siblings = &mut self.nodes[parent.0].children;
        let Some(index) = siblings.iter().position(|c| *c == old) else {
            return false;
        };
        siblings.splice(index..=index, replacements.iter().copied());
        for node in replacements {
            self.nodes[node.0].parent = Some(parent);
        }
        self.nodes[old.0].parent = None;
        true
    }

    /// Whether the node is reachable from the current root
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All nodes under `id` in tree order, `id` included
    pub fn traverse(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First element under `scope` (inclusive) matching `predicate`
    pub fn find_first<F>(&self, scope: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.traverse(scope)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(&predicate))
    }

    /// All elements under `scope` (inclusive) matching `predicate`
    pub fn find_all<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.traverse(scope)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(&predicate))
            .collect()
    }

    /// The node itself or its nearest ancestor element matching `predicate`
    pub fn closest<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(&predicate) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Get a connected element by its `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.find_first(self.root, |e| e.id() == Some(id))
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    /// The `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.find_first(self.root, |e| e.is("head"))
    }

    /// The `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.find_first(self.root, |e| e.is("body"))
    }

    /// The `<head>` element, creating `<html><head>` when missing
    pub fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }
        let html = match self.document_element() {
            Some(html) => html,
            None => {
                let html = self.create_element("html");
                self.append_child(self.root, html);
                html
            }
        };
        let head = self.create_element("head");
        self.nodes[html.0].children.insert(0, head);
        self.nodes[head.0].parent = Some(html);
        head
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.traverse(id)
            .into_iter()
            .filter_map(|n| match &self.node(n)?.node_type {
                NodeType::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace the children of `id` with a single text node
    pub fn set_text_content(&mut self, id: NodeId, content: &str) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.detach(child);
        }
        if !content.is_empty() {
            let text = self.create_text(content);
            self.append_child(id, text);
        }
    }

    /// Record the layout box of an element
    pub fn set_bounding_rect(&mut self, id: NodeId, rect: Rect) {
        self.rects.insert(id, rect);
    }

    /// Layout box of an element
    pub fn bounding_client_rect(&self, id: NodeId) -> Rect {
        self.rects.get(&id).copied().unwrap_or_default()
    }

    /// Request a full navigation of this document to `url`
    pub fn navigate(&mut self, url: Url) {
        log::info!("navigating to {}", url);
        self.navigation = Some(url);
    }

    /// Pending navigation target, if any
    pub fn pending_navigation(&self) -> Option<&Url> {
        self.navigation.as_ref()
    }

    /// Take the pending navigation target
    pub fn take_navigation(&mut self) -> Option<Url> {
        self.navigation.take()
    }

    /// Tear the document down and replace it with `html`
    /// (open/write/close semantics)
    pub fn rewrite(&mut self, html: &str) -> Result<()> {
        let root = self.push(NodeType::Document);
        self.root = root;
        self.rects.clear();
        HtmlParser::new().parse_into(self, html)
    }

    /// Serialize a node and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        serialize::outer_html(self, self.root)
    }

    /// Number of nodes attached to the current root
    pub fn connected_count(&self) -> usize {
        self.traverse(self.root).len()
    }
}
