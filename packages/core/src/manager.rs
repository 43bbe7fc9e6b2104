//! Consuming a chain of waiters.
//!
//! A blocking builtin may hand the scheduler a waiter whose continuation
//! names another waiter, for example "wait for input on these sockets, or
//! for any of these dialogs". The `BlockManager` decides how such a chain is
//! waited on: every link waits on its own thread and the first link to
//! become ready supplies the notifier tag. Links that lose stay pending
//! with the manager until a later call collects them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, trace};

use crate::error::{BlockError, Result};
use crate::waiter::{chain, Waiter, WaiterId};

/// Configuration for the block manager.
#[derive(Debug, Clone)]
pub struct BlockManagerConfig {
    /// Name prefix for chain link threads.
    pub thread_name: String,
}

impl Default for BlockManagerConfig {
    fn default() -> Self {
        Self {
            thread_name: "anyready-link".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Links {
    /// Links with a worker still inside `block()`.
    in_flight: HashSet<WaiterId>,
    /// Outcomes no caller has collected yet.
    finished: HashMap<WaiterId, Result<String>>,
}

#[derive(Debug, Default)]
struct Shared {
    links: Mutex<Links>,
    done: Condvar,
}

impl Shared {
    fn finish(&self, id: WaiterId, outcome: Result<String>) {
        let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
        links.in_flight.remove(&id);
        links.finished.insert(id, outcome);
        self.done.notify_all();
    }
}

/// Records a link's outcome when its worker ends, unwinding included.
struct Report {
    shared: Arc<Shared>,
    id: WaiterId,
    outcome: Option<Result<String>>,
}

impl Drop for Report {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(Err(BlockError::ManagerDisconnected));
        self.shared.finish(self.id, outcome);
    }
}

fn run_link(shared: Arc<Shared>, link: Arc<dyn Waiter>) {
    let mut report = Report {
        shared,
        id: link.id(),
        outcome: None,
    };
    report.outcome = Some(link.block().and_then(|_| link.notifier_tag()));
}

/// Waits on a chain of waiters and reports the first one ready.
///
/// Waiters cannot be cancelled, so a link that loses the race keeps its
/// worker. The manager remembers it: the next call that reaches the same
/// link waits on that worker instead of starting another one, and an
/// outcome it produced in the meantime is returned straight away. Clones
/// share this bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct BlockManager {
    config: BlockManagerConfig,
    shared: Arc<Shared>,
}

impl BlockManager {
    pub fn new(config: BlockManagerConfig) -> Self {
        Self {
            config,
            shared: Arc::default(),
        }
    }

    /// Block until any link of the chain starting at `head` is ready and
    /// return that link's notifier tag.
    ///
    /// A chain with a single idle link blocks on the calling thread. Other
    /// links each get a worker thread. When several outcomes are waiting,
    /// the one earliest in the chain is returned. If that link failed, its
    /// error is returned.
    pub fn block(&self, head: Arc<dyn Waiter>) -> Result<String> {
        let links = chain(&head);
        debug!(links = links.len(), "blocking on chain");

        if let [only] = links.as_slice() {
            let mut state = self.lock()?;
            let id = only.id();
            if !state.in_flight.contains(&id) && !state.finished.contains_key(&id) {
                state.in_flight.insert(id);
                drop(state);
                run_link(Arc::clone(&self.shared), Arc::clone(only));
            }
        }

        let mut state = self.lock()?;
        loop {
            let ready = links.iter().enumerate().find_map(|(index, link)| {
                state
                    .finished
                    .remove(&link.id())
                    .map(|outcome| (index, outcome))
            });
            if let Some((index, outcome)) = ready {
                debug!(index, ok = outcome.is_ok(), "chain link finished first");
                return outcome;
            }

            for (index, link) in links.iter().enumerate() {
                let id = link.id();
                if state.in_flight.contains(&id) {
                    trace!(index, "chain link already pending");
                    continue;
                }
                let shared = Arc::clone(&self.shared);
                let link = Arc::clone(link);
                thread::Builder::new()
                    .name(format!("{}-{}", self.config.thread_name, index))
                    .spawn(move || run_link(shared, link))?;
                state.in_flight.insert(id);
            }

            state = self.shared.done.wait(state).map_err(|_| BlockError::Poisoned)?;
        }
    }

    /// Number of chain links with a worker still waiting.
    pub fn pending(&self) -> usize {
        self.shared
            .links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .len()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Links>> {
        self.shared.links.lock().map_err(|_| BlockError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waiter::Continuation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A waiter that is ready immediately with a fixed tag.
    struct Immediate {
        id: WaiterId,
        link: Continuation,
        tag: String,
        blocks: AtomicUsize,
    }

    impl Immediate {
        fn new(tag: &str) -> Arc<Self> {
            Arc::new(Self {
                id: WaiterId::new(),
                link: Continuation::new(),
                tag: tag.to_string(),
                blocks: AtomicUsize::new(0),
            })
        }
    }

    impl Waiter for Immediate {
        fn id(&self) -> WaiterId {
            self.id
        }

        fn block(&self) -> Result<String> {
            self.blocks.fetch_add(1, Ordering::SeqCst);
            Ok(self.tag.clone())
        }

        fn notifier_tag(&self) -> Result<String> {
            Ok(self.tag.clone())
        }

        fn link(&self) -> &Continuation {
            &self.link
        }
    }

    /// A waiter that blocks until opened.
    struct Latch {
        id: WaiterId,
        link: Continuation,
        open: Mutex<bool>,
        opened: Condvar,
        blocks: AtomicUsize,
    }

    impl Latch {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: WaiterId::new(),
                link: Continuation::new(),
                open: Mutex::new(false),
                opened: Condvar::new(),
                blocks: AtomicUsize::new(0),
            })
        }

        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }
    }

    impl Waiter for Latch {
        fn id(&self) -> WaiterId {
            self.id
        }

        fn block(&self) -> Result<String> {
            self.blocks.fetch_add(1, Ordering::SeqCst);
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.opened.wait(open).unwrap();
            }
            Ok("latch".to_string())
        }

        fn notifier_tag(&self) -> Result<String> {
            Ok("LATCH x".to_string())
        }

        fn link(&self) -> &Continuation {
            &self.link
        }
    }

    fn wait_for_pending(manager: &BlockManager, count: usize) {
        while manager.pending() != count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn config_default() {
        let config = BlockManagerConfig::default();
        assert_eq!(config.thread_name, "anyready-link");
    }

    #[test]
    fn single_link_blocks_inline() {
        let waiter = Immediate::new("ONLY x");
        let manager = BlockManager::default();
        assert_eq!(manager.block(waiter.clone()).unwrap(), "ONLY x");
        assert_eq!(waiter.blocks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn self_cycle_is_a_single_link() {
        let waiter = Immediate::new("LOOP x");
        waiter.set_continuation(waiter.clone());

        let manager = BlockManager::default();
        assert_eq!(manager.block(waiter.clone()).unwrap(), "LOOP x");

        waiter.clear_continuation();
    }

    #[test]
    fn losing_link_is_reused_not_respawned() {
        let latch = Latch::new();
        let fallback = Immediate::new("NOW y");
        latch.set_continuation(fallback.clone());
        let head: Arc<dyn Waiter> = latch.clone();

        let manager = BlockManager::default();
        assert_eq!(manager.block(head.clone()).unwrap(), "NOW y");
        assert_eq!(manager.pending(), 1);

        assert_eq!(manager.block(head.clone()).unwrap(), "NOW y");
        assert_eq!(manager.pending(), 1);
        assert_eq!(fallback.blocks.load(Ordering::SeqCst), 2);

        latch.release();
        wait_for_pending(&manager, 0);

        // The outcome produced between calls is delivered by the next one.
        assert_eq!(manager.block(head).unwrap(), "LATCH x");
        assert_eq!(latch.blocks.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.blocks.load(Ordering::SeqCst), 2);

        latch.clear_continuation();
    }

    #[test]
    fn pending_single_link_is_not_run_inline() {
        let latch = Latch::new();
        let fallback = Immediate::new("NOW y");
        latch.set_continuation(fallback.clone());

        let manager = BlockManager::default();
        let head: Arc<dyn Waiter> = latch.clone();
        assert_eq!(manager.block(head).unwrap(), "NOW y");

        latch.clear_continuation();
        let waiting = manager.clone();
        let only: Arc<dyn Waiter> = latch.clone();
        let join = thread::spawn(move || waiting.block(only));

        latch.release();
        assert_eq!(join.join().unwrap().unwrap(), "LATCH x");
        assert_eq!(latch.blocks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_pending_links() {
        let latch = Latch::new();
        latch.set_continuation(Immediate::new("NOW y"));
        let head: Arc<dyn Waiter> = latch.clone();

        let manager = BlockManager::default();
        manager.block(head).unwrap();
        assert_eq!(manager.clone().pending(), 1);

        latch.release();
        wait_for_pending(&manager, 0);
        latch.clear_continuation();
    }
}
