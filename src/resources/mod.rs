//! Resource management
//!
//! Decodes the manifests carried by `loadAll` calls and injects the
//! stylesheets and scripts a page does not have yet.

mod loader;
mod manifest;
mod registry;

pub use loader::{LoadReport, ResourceLoader};
pub use manifest::{Attributes, ExternalResource, NamedResource, ResourceManifest};
pub use registry::{ResourceKind, ResourceRegistry};
