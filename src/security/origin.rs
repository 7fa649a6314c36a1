//! Same-origin checks
//!
//! Background requests only carry credentials to the document's own origin,
//! and external resources are considered identical when they share origin
//! and path.

use url::Url;

/// Whether two URLs share scheme, host and port
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Whether credentials may be attached to a request from `document` to `target`
pub fn credentials_allowed(document: &Url, target: &Url) -> bool {
    same_origin(document, target)
}

/// Whether two resource URLs designate the same resource, ignoring query and
/// fragment
pub fn same_resource(a: &Url, b: &Url) -> bool {
    same_origin(a, b) && a.path() == b.path()
}
