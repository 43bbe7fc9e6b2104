//! Blockable resources.
//!
//! Each resource implements [`anyready_core::Blockable`] for one kind of
//! readiness and wakes its subscribers through a [`WakeList`] whenever that
//! readiness may have changed.
//!
//! | Resource | Ready when |
//! |---|---|
//! | [`ReadyFlag`] | the flag is set |
//! | [`Mailbox`] | at least one line is queued |
//! | [`Deadline`] | its instant has passed |
//! | [`Signal`] | raised since this waiter last saw it |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use anyready_core::{BulkWaiter, Registry};
//! use anyready_resources::Mailbox;
//! use anyready_value::RuntimeVars;
//!
//! let registry = Registry::new();
//! let stdin = Arc::new(Mailbox::new());
//! registry.insert("stdin", stdin.clone());
//!
//! let waiter = Arc::new(
//!     BulkWaiter::new("READLINE", registry, Arc::new(RuntimeVars::new())).unwrap(),
//! );
//! stdin.subscribe(&waiter);
//! stdin.push("hello");
//!
//! waiter.populate_handle_set(&["stdin".into()]).unwrap();
//! assert_eq!(waiter.block().unwrap(), "stdin");
//! assert_eq!(stdin.pop().as_deref(), Some("hello"));
//! ```

mod deadline;
mod flag;
mod mailbox;
mod signal;
mod wake_list;

pub use deadline::Deadline;
pub use flag::ReadyFlag;
pub use mailbox::Mailbox;
pub use signal::Signal;
pub use wake_list::WakeList;
