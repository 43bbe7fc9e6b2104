//! Line queues, the shape of most readable resources.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyready_core::{Blockable, Wake, WaiterId};

use crate::wake_list::WakeList;

/// A FIFO of lines; ready while it holds at least one.
#[derive(Debug, Default)]
pub struct Mailbox {
    lines: Mutex<VecDeque<String>>,
    wakers: WakeList,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line and wake subscribers.
    pub fn push(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(line.into());
        self.wakers.wake_all();
    }

    /// Take the oldest line.
    pub fn pop(&self) -> Option<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe<W: Wake + 'static>(&self, waker: &Arc<W>) {
        self.wakers.subscribe(waker);
    }
}

impl Blockable for Mailbox {
    fn would_block(&self, _waiter: WaiterId) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_while_non_empty() {
        let mailbox = Mailbox::new();
        let id = WaiterId::new();
        assert!(mailbox.would_block(id));

        mailbox.push("one");
        mailbox.push(String::from("two"));
        assert!(!mailbox.would_block(id));
        assert_eq!(mailbox.len(), 2);

        assert_eq!(mailbox.pop().as_deref(), Some("one"));
        assert_eq!(mailbox.pop().as_deref(), Some("two"));
        assert!(mailbox.would_block(id));
        assert_eq!(mailbox.pop(), None);
    }
}
