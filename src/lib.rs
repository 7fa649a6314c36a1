//! # nagare-client - Client runtime for continuation-based web applications
//!
//! Pages rendered by a Nagare server carry action tags on their links and
//! submit controls. This crate turns clicks on those elements into
//! background requests, executes the server's JavaScript reply in a scoped
//! interpreter, and applies the calls it makes: loading stylesheets and
//! scripts at most once, swapping nodes for fresh markup, and issuing
//! further remote calls.
//!
//! ## Architecture
//!
//! - **dom**: arena document, HTML parsing, serialization and form data
//! - **dispatch**: action tags and click classification
//! - **network**: background requests, redirect and error-page handling
//! - **js_engine**: scoped script execution and the deferred script queue
//! - **resources**: named and external resource loading
//! - **patcher**: `replaceNode` with script extraction
//! - **engine**: the per-page [`Runtime`] tying the above together
//! - **security**: origin checks for credentials and resource identity
//! - **utils**: error types and configuration

pub mod dispatch;
pub mod dom;
pub mod engine;
pub mod js_engine;
pub mod network;
pub mod patcher;
pub mod resources;
pub mod security;
pub mod utils;

// Re-export main types for convenience
pub use dispatch::{ClickEvent, EventDisposition};
pub use engine::Runtime;
pub use utils::config::RuntimeConfig;
pub use utils::error::{NagareError, Result};

/// Client version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "nagare-client";
