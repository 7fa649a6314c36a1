//! Document model for the runtime
//!
//! An arena DOM with html5ever parsing, serialization and form data
//! collection. This is the document that clicks are read from and that
//! server replies patch.

mod form;
mod html;
mod node;
mod serialize;

pub use form::{form_owner, FormData};
pub use html::HtmlParser;
pub use node::{Document, ElementData, Node, NodeId, NodeType, Rect};
pub use serialize::{inner_html, outer_html};

use std::cell::RefCell;
use std::rc::Rc;

/// Document handle shared by the runtime's components
pub type SharedDocument = Rc<RefCell<Document>>;
