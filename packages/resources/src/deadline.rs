//! One-shot timers.
//!
//! Waiters have no timeout of their own. A script that needs one adds a
//! deadline handle to the set; when it fires the wait ends with that handle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyready_core::{Blockable, Wake, WaiterId};
use tracing::trace;

use crate::wake_list::WakeList;

/// A resource that becomes ready at a fixed instant.
#[derive(Debug)]
pub struct Deadline {
    at: Instant,
    wakers: WakeList,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self {
            at,
            wakers: WakeList::new(),
        }
    }

    pub fn after(duration: Duration) -> Self {
        Self::at(Instant::now() + duration)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn has_passed(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn subscribe<W: Wake + 'static>(&self, waker: &Arc<W>) {
        self.wakers.subscribe(waker);
    }

    /// Start a timer thread that wakes subscribers once the deadline passes.
    pub fn start(self: &Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        let deadline = Arc::clone(self);
        thread::Builder::new()
            .name("anyready-deadline".to_string())
            .spawn(move || {
                let remaining = deadline.at.saturating_duration_since(Instant::now());
                thread::sleep(remaining);
                trace!(?remaining, "deadline fired");
                deadline.wakers.wake_all();
            })
    }
}

impl Blockable for Deadline {
    fn would_block(&self, _waiter: WaiterId) -> bool {
        !self.has_passed()
    }
}
