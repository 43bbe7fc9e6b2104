//! Edge-triggered, per-waiter signals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyready_core::{Blockable, Wake, WaiterId};

use crate::wake_list::WakeList;

#[derive(Debug, Default)]
struct SignalState {
    generation: u64,
    seen: HashMap<WaiterId, u64>,
}

/// A signal each waiter observes once per raise.
///
/// `would_block` answering `false` acknowledges the raise for that waiter,
/// so the next scan by the same waiter blocks again until the next raise.
/// Other waiters keep their own view.
#[derive(Debug, Default)]
pub struct Signal {
    state: Mutex<SignalState>,
    wakers: WakeList,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake subscribers.
    pub fn raise(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation += 1;
        self.wakers.wake_all();
    }

    /// How many times the signal has been raised.
    pub fn generation(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn subscribe<W: Wake + 'static>(&self, waker: &Arc<W>) {
        self.wakers.subscribe(waker);
    }
}

impl Blockable for Signal {
    fn would_block(&self, waiter: WaiterId) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = state.generation;
        let seen = state.seen.entry(waiter).or_insert(0);
        if *seen < generation {
            *seen = generation;
            false
        } else {
            true
        }
    }
}
