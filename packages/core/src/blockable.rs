//! Capability contracts for blockable resources.

use crate::waiter::WaiterId;

/// A resource that can say whether it would block a given waiter.
///
/// Sockets, dialogs, timers and pipes all look the same to a waiter through
/// this trait. Implementations may track readiness per waiter (for example
/// edge-triggered signals), which is why the asking waiter's identity is
/// passed in.
///
/// `would_block` is called while the waiter holds its own monitor, so it
/// must never call back into the waiter.
pub trait Blockable: Send + Sync {
    /// Returns `false` if the resource is ready for `waiter` right now.
    fn would_block(&self, waiter: WaiterId) -> bool;
}

/// Receiver of readiness notifications.
///
/// A resource calls `wake` on every interested waiter after its readiness
/// may have changed. Resources must release their own locks first: a
/// waiter's scan takes the waiter monitor and then the resource, so waking
/// while holding the resource lock inverts that order.
pub trait Wake: Send + Sync {
    fn wake(&self);
}
