//! HTML serialization of arena nodes

use super::node::{Document, NodeId, NodeType};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize a node and its subtree
pub fn outer_html(document: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(document, id, &mut out, false);
    out
}

/// Serialize the children of a node
pub fn inner_html(document: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = document
        .element(id)
        .is_some_and(|e| RAW_TEXT_ELEMENTS.contains(&e.tag_name.as_str()));
    for child in document.children(id) {
        write_node(document, *child, &mut out, raw);
    }
    out
}

fn write_node(document: &Document, id: NodeId, out: &mut String, raw_text: bool) {
    let Some(node) = document.node(id) else {
        return;
    };

    match &node.node_type {
        NodeType::Document => {
            for child in node.children() {
                write_node(document, *child, out, false);
            }
        }
        NodeType::Element(element) => {
            out.push('<');
            out.push_str(&element.tag_name);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(value, true));
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&element.tag_name.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&element.tag_name.as_str());
            for child in node.children() {
                write_node(document, *child, out, raw);
            }
            out.push_str("</");
            out.push_str(&element.tag_name);
            out.push('>');
        }
        NodeType::Text(text) if raw_text => out.push_str(text),
        NodeType::Text(text) => out.push_str(&escape(text, false)),
        NodeType::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape(input: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
