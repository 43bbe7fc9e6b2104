//! Subscriber lists for readiness notifications.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use anyready_core::Wake;
use tracing::trace;

/// Weakly-held set of waiters to wake on readiness changes.
///
/// Dropped subscribers are pruned on the next `wake_all`.
#[derive(Default)]
pub struct WakeList {
    subscribers: Mutex<Vec<Weak<dyn Wake>>>,
}

impl WakeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<W: Wake + 'static>(&self, waker: &Arc<W>) {
        let weak: Weak<dyn Wake> = Arc::downgrade(waker) as Weak<W>;
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(weak);
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wake every live subscriber.
    ///
    /// Subscribers are collected first and woken after the list lock is
    /// released, so a subscriber may resubscribe from `wake`.
    pub fn wake_all(&self) {
        let live: Vec<Arc<dyn Wake>> = {
            let mut subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        trace!(subscribers = live.len(), "waking subscribers");
        for waker in live {
            waker.wake();
        }
    }
}

impl std::fmt::Debug for WakeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeList")
            .field("subscribers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Wake for Counter {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn wakes_each_subscriber() {
        let list = WakeList::new();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        list.subscribe(&a);
        list.subscribe(&b);

        list.wake_all();
        list.wake_all();
        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let list = WakeList::new();
        let a = Arc::new(Counter::default());
        list.subscribe(&a);
        {
            let b = Arc::new(Counter::default());
            list.subscribe(&b);
            assert_eq!(list.len(), 2);
        }
        assert_eq!(list.len(), 1);

        list.wake_all();
        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert!(!list.is_empty());
    }
}
