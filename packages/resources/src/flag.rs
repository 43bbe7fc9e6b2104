//! Manually controlled readiness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyready_core::{Blockable, Wake, WaiterId};

use crate::wake_list::WakeList;

/// A resource that is ready while its flag is set.
#[derive(Debug, Default)]
pub struct ReadyFlag {
    ready: AtomicBool,
    wakers: WakeList,
}

impl ReadyFlag {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            wakers: WakeList::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Mark the resource ready and wake subscribers.
    pub fn set(&self) {
        self.ready.store(true, Ordering::SeqCst);
        self.wakers.wake_all();
    }

    /// Mark the resource as blocking again.
    pub fn clear(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn subscribe<W: Wake + 'static>(&self, waker: &Arc<W>) {
        self.wakers.subscribe(waker);
    }
}

impl Blockable for ReadyFlag {
    fn would_block(&self, _waiter: WaiterId) -> bool {
        !self.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_flag() {
        let flag = ReadyFlag::new(false);
        let id = WaiterId::new();
        assert!(flag.would_block(id));

        flag.set();
        assert!(!flag.would_block(id));
        assert!(flag.is_ready());

        flag.clear();
        assert!(flag.would_block(id));
    }

    #[test]
    fn default_blocks() {
        assert!(ReadyFlag::default().would_block(WaiterId::new()));
    }
}
