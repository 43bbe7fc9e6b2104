//! The abstract waiter and its continuation link.
//!
//! A waiter is a blocking operation the interpreter hands back to its
//! scheduler. Waiters can be composed into a singly-linked chain: each one
//! may name a single continuation, a different waiter the scheduler should
//! also consider. How the chain is consumed is up to the consumer (see
//! [`crate::BlockManager`]); this module only stores and exposes the links.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::error::Result;

/// Identity a resource uses to tell waiters apart.
///
/// Every [`crate::Blockable::would_block`] call carries the asking waiter's
/// id, so a resource with per-waiter state (an edge-triggered signal, say)
/// can answer differently for two waiters scanning the same handle. The
/// block manager keys its pending chain links by it as well. An id stays
/// fixed for the life of its waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(Uuid);

impl WaiterId {
    /// A fresh id, distinct from every other waiter's.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Restore an id recorded earlier, e.g. from a log line.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WaiterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WaiterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for a waiter's optional continuation.
#[derive(Default)]
pub struct Continuation {
    next: Mutex<Option<Arc<dyn Waiter>>>,
}

impl Continuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, next: Arc<dyn Waiter>) {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = Some(next);
    }

    pub fn clear(&self) {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<Arc<dyn Waiter>> {
        self.next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(next) => write!(f, "Continuation({})", next.id()),
            None => f.write_str("Continuation(none)"),
        }
    }
}

/// A blocking operation returned to the scheduler.
///
/// Implementors provide `block` and `notifier_tag` plus access to their
/// [`Continuation`]; the continuation accessors come for free.
pub trait Waiter: Send + Sync {
    /// This waiter's identity.
    fn id(&self) -> WaiterId;

    /// Block until the operation is ready, returning what became ready.
    fn block(&self) -> Result<String>;

    /// The string handed back to the script once `block` has returned.
    fn notifier_tag(&self) -> Result<String>;

    /// The continuation storage.
    fn link(&self) -> &Continuation;

    fn set_continuation(&self, next: Arc<dyn Waiter>) {
        self.link().set(next);
    }

    fn clear_continuation(&self) {
        self.link().clear();
    }

    fn continuation(&self) -> Option<Arc<dyn Waiter>> {
        self.link().get()
    }
}

/// Collect the waiters reachable from `head`, head first.
///
/// Stops at the first waiter already visited, so a cyclic composition
/// yields each member once.
pub fn chain(head: &Arc<dyn Waiter>) -> Vec<Arc<dyn Waiter>> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut current = Some(Arc::clone(head));

    while let Some(waiter) = current {
        if !seen.insert(waiter.id()) {
            break;
        }
        current = waiter.continuation();
        links.push(waiter);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockError;

    struct Stub {
        id: WaiterId,
        link: Continuation,
    }

    impl Stub {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: WaiterId::new(),
                link: Continuation::new(),
            })
        }
    }

    impl Waiter for Stub {
        fn id(&self) -> WaiterId {
            self.id
        }

        fn block(&self) -> Result<String> {
            Ok("stub".to_string())
        }

        fn notifier_tag(&self) -> Result<String> {
            Err(BlockError::NoBlockResult {
                prefix: "STUB".to_string(),
            })
        }

        fn link(&self) -> &Continuation {
            &self.link
        }
    }

    #[test]
    fn waiter_id_display() {
        let id = WaiterId::new();
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn waiter_id_default_is_unique() {
        assert_ne!(WaiterId::default(), WaiterId::default());
    }

    #[test]
    fn waiter_id_from_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(WaiterId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn continuation_set_and_clear() {
        let a = Stub::new();
        let b = Stub::new();
        assert!(a.continuation().is_none());

        a.set_continuation(b.clone());
        assert_eq!(a.continuation().map(|w| w.id()), Some(b.id()));

        a.clear_continuation();
        assert!(a.continuation().is_none());
    }

    #[test]
    fn continuation_is_replaced_not_appended() {
        let a = Stub::new();
        let b = Stub::new();
        let c = Stub::new();

        a.set_continuation(b);
        a.set_continuation(c.clone());
        assert_eq!(a.continuation().map(|w| w.id()), Some(c.id()));
    }

    #[test]
    fn chain_follows_links() {
        let a = Stub::new();
        let b = Stub::new();
        let c = Stub::new();
        a.set_continuation(b.clone());
        b.set_continuation(c.clone());

        let head: Arc<dyn Waiter> = a.clone();
        let ids: Vec<_> = chain(&head).iter().map(|w| w.id()).collect();
        assert_eq!(ids, vec![a.id(), b.id(), c.id()]);
    }

    #[test]
    fn chain_stops_at_cycle() {
        let a = Stub::new();
        let b = Stub::new();
        a.set_continuation(b.clone());
        b.set_continuation(a.clone());

        let head: Arc<dyn Waiter> = a.clone();
        assert_eq!(chain(&head).len(), 2);

        // Break the cycle so both stubs are freed.
        b.clear_continuation();
    }

    #[test]
    fn continuation_debug() {
        let a = Stub::new();
        assert_eq!(format!("{:?}", a.link), "Continuation(none)");
        let b = Stub::new();
        a.set_continuation(b.clone());
        assert!(format!("{:?}", a.link).contains(&b.id().to_string()));
    }
}
