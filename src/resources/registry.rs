//! Loaded-resource bookkeeping
//!
//! Names only ever get added. A page reload builds a new runtime and with it
//! a new registry.

use std::collections::HashSet;

/// Kind of named resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Css,
    Js,
}

/// Named resources already injected or evaluated by this runtime
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    loaded: HashSet<(ResourceKind, String)>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` has been recorded
    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.loaded.contains(&(kind, name.to_string()))
    }

    /// Record `name`; returns false if it was already present
    pub fn insert(&mut self, kind: ResourceKind, name: impl Into<String>) -> bool {
        self.loaded.insert((kind, name.into()))
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
