//! HTML5 parser implementation using html5ever
//!
//! html5ever builds an `RcDom`, which is then copied into the document
//! arena. Full documents are imported under the document root; fragments are
//! imported as detached nodes ready to be swapped into the live tree.

use super::node::{Document, ElementData, NodeId, NodeType};
use crate::utils::error::RenderError;
use crate::utils::Result;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, parse_fragment, ParseOpts};
use markup5ever::{ns, LocalName, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// HTML5 parser using html5ever
pub struct HtmlParser {
    opts: ParseOpts,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            opts: ParseOpts {
                tree_builder: TreeBuilderOpts {
                    drop_doctype: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// Parse a full page and attach it under the document root
    pub fn parse_into(&self, document: &mut Document, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Ok(());
        }

        let dom = parse_document(RcDom::default(), self.opts.clone()).one(content);

        let root = document.root();
        for child in dom.document.children.borrow().iter() {
            if let Some(node) = import(document, child) {
                document.append_child(root, node);
            }
        }
        Ok(())
    }

    /// Parse a fragment in the context of a `context` element.
    ///
    /// The returned top-level nodes are detached.
    pub fn parse_fragment(
        &self,
        document: &mut Document,
        content: &str,
        context: &str,
    ) -> Result<Vec<NodeId>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        if context.is_empty() {
            return Err(RenderError::HtmlParse("fragment needs a context element".to_string()).into());
        }

        let context_name = QualName::new(None, ns!(html), LocalName::from(context));
        let dom = parse_fragment(
            RcDom::default(),
            self.opts.clone(),
            context_name,
            Vec::new(),
            false,
        )
        .one(content);

        // The fragment parser wraps its output in a synthetic <html> element
        let mut nodes = Vec::new();
        for wrapper in dom.document.children.borrow().iter() {
            for child in wrapper.children.borrow().iter() {
                if let Some(node) = import(document, child) {
                    nodes.push(node);
                }
            }
        }
        Ok(nodes)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy an rcdom subtree into the arena, returning its detached root
fn import(document: &mut Document, handle: &Handle) -> Option<NodeId> {
    let id = match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut element = ElementData::new(name.local.to_string());
            for attr in attrs.borrow().iter() {
                element.set_attribute(attr.name.local.to_string(), attr.value.to_string());
            }
            document.push(NodeType::Element(element))
        }
        NodeData::Text { contents } => document.create_text(contents.borrow().to_string()),
        NodeData::Comment { contents } => document.create_comment(contents.to_string()),
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            return None;
        }
    };

    for child in handle.children.borrow().iter() {
        if let Some(node) = import(document, child) {
            document.append_child(id, node);
        }
    }
    Some(id)
}
