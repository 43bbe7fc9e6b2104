//! Insertion-ordered set of handles.

use std::collections::HashSet;

/// Ordered set of unique handles.
///
/// Iteration order is insertion order; it decides which handle wins when
/// several are ready at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HandleSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl HandleSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a handle. A duplicate keeps its first position.
    pub(crate) fn insert(&mut self, handle: String) -> bool {
        if self.members.contains(&handle) {
            return false;
        }
        self.members.insert(handle.clone());
        self.order.push(handle);
        true
    }

    pub(crate) fn contains(&self, handle: &str) -> bool {
        self.members.contains(handle)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|h| h.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}
