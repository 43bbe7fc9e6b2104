//! Blocking on many resources at once.
//!
//! Interpreter builtins such as "read a line from any of these sockets"
//! need a select/poll over resources the core knows nothing about. This
//! crate provides the resource-agnostic part:
//!
//! - [`Blockable`]: anything that can say whether it would block a waiter
//! - [`HandleValidator`]: optional registration-time checks on handles
//! - [`Waiter`]: a blocking operation with an optional continuation
//! - [`BulkWaiter`]: waits until any handle in an ordered set is ready
//! - [`BlockManager`]: waits on a chain of waiters
//!
//! Resources are looked up by handle in a shared [`Registry`]. When a
//! resource's readiness changes it wakes interested waiters through
//! [`Wake`]; the waiter then rescans its handles in order.

mod blockable;
mod bulk;
mod error;
mod handle_set;
mod manager;
mod registry;
mod validator;
mod waiter;

pub use blockable::{Blockable, Wake};
pub use bulk::{BlockArg, BulkWaiter, BulkWaiterBuilder, WaitState, WaiterOptions, BLANK_HANDLE};
pub use error::{BlockError, Result};
pub use manager::{BlockManager, BlockManagerConfig};
pub use registry::Registry;
pub use validator::{AcceptAll, HandleValidator};
pub use waiter::{chain, Continuation, Waiter, WaiterId};
