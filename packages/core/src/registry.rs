//! The shared handle registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::blockable::Blockable;

/// Shared mapping from handle to blockable resource.
///
/// The registry is owned by whatever creates resources (socket layers,
/// dialog managers, timers); cloning it shares the same underlying map.
/// Waiters only ever look handles up.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Blockable>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource, returning the one previously under `handle`.
    pub fn insert(
        &self,
        handle: impl Into<String>,
        blockable: Arc<dyn Blockable>,
    ) -> Option<Arc<dyn Blockable>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.into(), blockable)
    }

    pub fn remove(&self, handle: &str) -> Option<Arc<dyn Blockable>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
    }

    /// Look a handle up by exact string.
    pub fn get(&self, handle: &str) -> Option<Arc<dyn Blockable>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .cloned()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut handles: Vec<_> = map.keys().collect();
        handles.sort();
        f.debug_struct("Registry").field("handles", &handles).finish()
    }
}
