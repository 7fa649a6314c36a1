//! DOM patching
//!
//! `replaceNode(id, html)` swaps a live element for freshly parsed markup.
//! Scripts inside the markup are never run by the parser: external ones are
//! recreated as new elements and queued for a single fetch, inline ones are
//! taken out of the fragment and queued as source. Both run on the next
//! tick, after the new nodes are in the document.

use crate::dom::{Document, ElementData, HtmlParser, NodeId};
use crate::js_engine::ScriptQueue;
use crate::utils::Result;

const SCRIPT_TYPES: &[&str] = &[
    "",
    "text/javascript",
    "application/javascript",
    "text/ecmascript",
    "application/ecmascript",
];

/// Replaces document nodes with server-rendered markup
#[derive(Default)]
pub struct DomPatcher {
    parser: HtmlParser,
}

impl DomPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the element with id `id` by the nodes parsed from `html`.
    ///
    /// Returns `Ok(false)`, leaving the document untouched, when `id` is not
    /// a connected element or `html` is blank.
    pub fn replace_node(
        &self,
        document: &mut Document,
        scripts: &mut ScriptQueue,
        id: &str,
        html: &str,
    ) -> Result<bool> {
        if html.trim().is_empty() {
            log::debug!("replaceNode({}): empty markup ignored", id);
            return Ok(false);
        }
        let Some(target) = document.get_element_by_id(id) else {
            log::debug!("replaceNode({}): no such node", id);
            return Ok(false);
        };

        let context = document
            .parent(target)
            .and_then(|p| document.element(p))
            .map(|e| e.tag_name.clone())
            .unwrap_or_else(|| "body".to_string());

        let mut nodes = self.parser.parse_fragment(document, html, &context)?;
        self.extract_scripts(document, scripts, &mut nodes);

        let swapped = document.replace_with(target, &nodes);
        log::trace!("replaceNode({}): {} node(s) inserted", id, nodes.len());
        Ok(swapped)
    }

    /// Queue the fragment's scripts in tree order and neutralize them in
    /// the fragment itself
    fn extract_scripts(&self, document: &mut Document, scripts: &mut ScriptQueue, nodes: &mut Vec<NodeId>) {
        let found: Vec<NodeId> = nodes
            .iter()
            .flat_map(|root| document.find_all(*root, is_executable_script))
            .collect();

        for script in found {
            let Some(element) = document.element(script).cloned() else {
                continue;
            };

            let replacement = match element.get_attribute("src") {
                Some(src) => {
                    match document.resolve(src) {
                        Ok(url) => scripts.push_external(url),
                        Err(e) => log::debug!("script not loaded: {}", e),
                    }
                    let fresh = document.create_element("script");
                    if let Some(data) = document.element_mut(fresh) {
                        for (name, value) in &element.attributes {
                            data.set_attribute(name.as_str(), value.as_str());
                        }
                    }
                    Some(fresh)
                }
                None => {
                    scripts.push_inline(document.text_content(script));
                    None
                }
            };

            match nodes.iter().position(|n| *n == script) {
                Some(index) => match replacement {
                    Some(fresh) => nodes[index] = fresh,
                    None => {
                        nodes.remove(index);
                    }
                },
                None => match replacement {
                    Some(fresh) => {
                        document.replace_with(script, &[fresh]);
                    }
                    None => document.detach(script),
                },
            }
        }
    }
}

/// Whether `element` is a script a browser would run
pub fn is_executable_script(element: &ElementData) -> bool {
    element.is("script")
        && element
            .get_attribute("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .is_none_or(|t| SCRIPT_TYPES.contains(&t.as_str()))
}
