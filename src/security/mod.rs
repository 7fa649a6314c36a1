//! Security module
//!
//! Origin rules applied to background requests and resource deduplication.

mod origin;

pub use origin::{credentials_allowed, same_origin, same_resource};
