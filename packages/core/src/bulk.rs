//! Wait until any one of many handles is ready.
//!
//! A `BulkWaiter` owns an ordered set of handles, resolves them against a
//! shared [`Registry`] and blocks until one of the resolved resources would
//! not block. It is its own monitor: a single mutex and condition variable
//! guard both the handle set and the scan, so repopulating the set can never
//! interleave with an in-flight scan.
//!
//! ```text
//!   block() ──► Scanning ──── ready handle found ────► Ready
//!                │   ▲
//!                │   └──────── notify ────────┐
//!                │                            │
//!                ├── every real handle blocks ┴─► SuspendedAwaitingNotify
//!                │
//!                └── no real handles ───────────► SuspendedBlankOnly
//!                                                 (any wake is an error)
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use anyready_value::{Table, Value, VariableManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::blockable::Wake;
use crate::error::{BlockError, Result};
use crate::handle_set::HandleSet;
use crate::registry::Registry;
use crate::validator::{AcceptAll, HandleValidator};
use crate::waiter::{Continuation, Waiter, WaiterId};

/// The reserved handle meaning "no resource here".
pub const BLANK_HANDLE: &str = "";

/// Options controlling how a `BulkWaiter` scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaiterOptions {
    /// Skip blank handles while scanning instead of resolving them.
    ///
    /// When every handle is blank the waiter can never be legitimately
    /// woken; see [`BulkWaiter::block`].
    pub bypass_blank_handles: bool,
}

impl Default for WaiterOptions {
    fn default() -> Self {
        Self {
            bypass_blank_handles: true,
        }
    }
}

/// Where a `block()` call currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// No `block()` call is in progress.
    Idle,
    /// Walking the handle set.
    Scanning,
    /// Suspended with no real handles. Nothing may wake this state.
    SuspendedBlankOnly,
    /// Suspended until a resource reports a readiness change.
    SuspendedAwaitingNotify,
    /// The last `block()` found a ready handle.
    Ready,
}

/// One population argument.
#[derive(Clone)]
pub enum BlockArg {
    /// A scalar; yields one handle.
    Value(Value),
    /// An associative array; yields one handle per key.
    Table(Table),
    /// A waiter to fall back on. Only valid as the last argument.
    Waiter(Arc<dyn Waiter>),
}

impl std::fmt::Debug for BlockArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockArg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            BlockArg::Table(t) => f.debug_tuple("Table").field(t).finish(),
            BlockArg::Waiter(w) => write!(f, "Waiter({})", w.id()),
        }
    }
}

impl From<Value> for BlockArg {
    fn from(v: Value) -> Self {
        BlockArg::Value(v)
    }
}

impl From<&str> for BlockArg {
    fn from(v: &str) -> Self {
        BlockArg::Value(Value::from(v))
    }
}

impl From<String> for BlockArg {
    fn from(v: String) -> Self {
        BlockArg::Value(Value::from(v))
    }
}

impl From<i64> for BlockArg {
    fn from(v: i64) -> Self {
        BlockArg::Value(Value::from(v))
    }
}

impl From<f64> for BlockArg {
    fn from(v: f64) -> Self {
        BlockArg::Value(Value::from(v))
    }
}

impl From<Table> for BlockArg {
    fn from(t: Table) -> Self {
        BlockArg::Table(t)
    }
}

impl From<Arc<dyn Waiter>> for BlockArg {
    fn from(w: Arc<dyn Waiter>) -> Self {
        BlockArg::Waiter(w)
    }
}

#[derive(Debug)]
struct BulkState {
    handles: HandleSet,
    result: Option<String>,
    wait_state: WaitState,
}

enum Scan {
    Ready(String),
    AllBlank,
    AllBlocked,
}

/// Builder for [`BulkWaiter`].
pub struct BulkWaiterBuilder {
    prefix: String,
    registry: Option<Registry>,
    vars: Option<Arc<dyn VariableManager>>,
    options: WaiterOptions,
}

impl BulkWaiterBuilder {
    /// The registry handles are resolved against. Required.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Runtime variables for CONVFMT and OFS. Required.
    pub fn vars(mut self, vars: Arc<dyn VariableManager>) -> Self {
        self.vars = Some(vars);
        self
    }

    pub fn options(mut self, options: WaiterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn bypass_blank_handles(mut self, bypass: bool) -> Self {
        self.options.bypass_blank_handles = bypass;
        self
    }

    pub fn build(self) -> Result<BulkWaiter> {
        if self.prefix.is_empty() {
            return Err(BlockError::Construction { field: "prefix" });
        }
        let registry = self
            .registry
            .ok_or(BlockError::Construction { field: "registry" })?;
        let vars = self
            .vars
            .ok_or(BlockError::Construction { field: "vars" })?;

        Ok(BulkWaiter {
            id: WaiterId::new(),
            prefix: self.prefix,
            registry,
            vars,
            options: self.options,
            link: Continuation::new(),
            state: Mutex::new(BulkState {
                handles: HandleSet::new(),
                result: None,
                wait_state: WaitState::Idle,
            }),
            ready: Condvar::new(),
        })
    }
}

/// Blocks until any handle in its set is ready.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use anyready_core::{Blockable, BulkWaiter, Registry, WaiterId};
/// use anyready_value::RuntimeVars;
///
/// struct Always(bool);
/// impl Blockable for Always {
///     fn would_block(&self, _: WaiterId) -> bool { self.0 }
/// }
///
/// let registry = Registry::new();
/// registry.insert("h1", Arc::new(Always(true)));
/// registry.insert("h2", Arc::new(Always(false)));
///
/// let waiter = BulkWaiter::new("READLINE", registry, Arc::new(RuntimeVars::new())).unwrap();
/// waiter.populate_handle_set(&["h1".into(), "h2".into()]).unwrap();
/// assert_eq!(waiter.block().unwrap(), "h2");
/// assert_eq!(waiter.notifier_tag().unwrap(), "READLINE h2");
/// ```
pub struct BulkWaiter {
    id: WaiterId,
    prefix: String,
    registry: Registry,
    vars: Arc<dyn VariableManager>,
    options: WaiterOptions,
    link: Continuation,
    state: Mutex<BulkState>,
    ready: Condvar,
}

impl BulkWaiter {
    /// Start building a waiter whose notifier tags begin with `prefix`.
    pub fn builder(prefix: impl Into<String>) -> BulkWaiterBuilder {
        BulkWaiterBuilder {
            prefix: prefix.into(),
            registry: None,
            vars: None,
            options: WaiterOptions::default(),
        }
    }

    /// Create a waiter with default options.
    pub fn new(
        prefix: impl Into<String>,
        registry: Registry,
        vars: Arc<dyn VariableManager>,
    ) -> Result<Self> {
        Self::builder(prefix).registry(registry).vars(vars).build()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn options(&self) -> WaiterOptions {
        self.options
    }

    /// Replace the handle set from script arguments, accepting every handle.
    pub fn populate_handle_set(&self, args: &[BlockArg]) -> Result<&Self> {
        self.populate_handle_set_with(args, &AcceptAll)
    }

    /// Replace the handle set from script arguments.
    ///
    /// Scalars yield one handle each and tables one handle per key, in
    /// argument order; everything is canonicalized with the current CONVFMT.
    /// A trailing [`BlockArg::Waiter`] becomes the continuation, otherwise
    /// any existing continuation is cleared.
    ///
    /// Every handle is validated before anything changes: on error the
    /// previous handle set and continuation are left as they were.
    pub fn populate_handle_set_with(
        &self,
        args: &[BlockArg],
        validator: &dyn HandleValidator,
    ) -> Result<&Self> {
        let Some((last, rest)) = args.split_last() else {
            return Err(BlockError::argument(
                &self.prefix,
                "requires at least one argument.",
            ));
        };

        let (continuation, items) = match last {
            BlockArg::Waiter(next) => {
                if rest.is_empty() {
                    return Err(BlockError::argument(
                        &self.prefix,
                        "requires at least one item to close-block on.",
                    ));
                }
                (Some(Arc::clone(next)), rest)
            }
            _ => (None, args),
        };

        let convfmt = self.vars.convfmt();
        let mut handles = HandleSet::new();
        for item in items {
            match item {
                BlockArg::Value(value) => {
                    self.accept(&mut handles, value.to_awk_string(&convfmt), validator)?;
                }
                BlockArg::Table(table) => {
                    for key in table.keys() {
                        self.accept(&mut handles, key.to_string(), validator)?;
                    }
                }
                BlockArg::Waiter(_) => {
                    return Err(BlockError::argument(
                        &self.prefix,
                        "accepts a blocker only as its last argument.",
                    ));
                }
            }
        }

        let mut state = self.lock()?;
        debug!(
            prefix = %self.prefix,
            handles = handles.len(),
            chained = continuation.is_some(),
            "populated handle set"
        );
        state.handles = handles;
        match continuation {
            Some(next) => self.set_continuation(next),
            None => self.clear_continuation(),
        }

        Ok(self)
    }

    fn accept(
        &self,
        handles: &mut HandleSet,
        handle: String,
        validator: &dyn HandleValidator,
    ) -> Result<()> {
        if let Some(reason) = validator.validate(&handle) {
            debug!(prefix = %self.prefix, %handle, %reason, "handle rejected");
            return Err(BlockError::Validation { handle, reason });
        }
        handles.insert(handle);
        Ok(())
    }

    /// Exact membership test against the current handle set.
    pub fn contains_handle(&self, handle: &str) -> bool {
        self.lock_unpoisoned().handles.contains(handle)
    }

    /// The current handle set, in scan order.
    pub fn handles(&self) -> Vec<String> {
        self.lock_unpoisoned().handles.to_vec()
    }

    /// Where the most recent `block()` call stands.
    pub fn state(&self) -> WaitState {
        self.lock_unpoisoned().wait_state
    }

    /// Wake every thread suspended in `block()` so it rescans.
    pub fn notify(&self) {
        let _state = self.lock_unpoisoned();
        self.ready.notify_all();
    }

    /// Block until some handle is ready and return it.
    ///
    /// Handles are scanned in insertion order and the first one whose
    /// resource would not block wins. If every real handle blocks, the
    /// waiter suspends until [`BulkWaiter::notify`] and then rescans from
    /// the top. An unregistered handle fails immediately.
    ///
    /// With no real handles (all blank, or none at all) the waiter suspends
    /// in a state nothing should wake; a wake from there, spurious or not,
    /// returns [`BlockError::InternalInvariant`].
    pub fn block(&self) -> Result<String> {
        let mut state = self.lock()?;

        loop {
            state.wait_state = WaitState::Scanning;
            trace!(prefix = %self.prefix, handles = state.handles.len(), "scanning");

            match self.scan(&state.handles) {
                Ok(Scan::Ready(handle)) => {
                    debug!(prefix = %self.prefix, %handle, "handle ready");
                    state.wait_state = WaitState::Ready;
                    state.result = Some(handle.clone());
                    return Ok(handle);
                }
                Ok(Scan::AllBlank) => {
                    debug!(prefix = %self.prefix, "suspending with only blank handles");
                    state.wait_state = WaitState::SuspendedBlankOnly;
                    state = self.ready.wait(state).map_err(|_| BlockError::Poisoned)?;
                    state.wait_state = WaitState::Idle;
                    error!(prefix = %self.prefix, "woken with only blank handles");
                    return Err(BlockError::InternalInvariant {
                        message: format!(
                            "{} blocker was woken but has no non-blank handles",
                            self.prefix
                        ),
                    });
                }
                Ok(Scan::AllBlocked) => {
                    debug!(prefix = %self.prefix, "all handles blocked, suspending");
                    state.wait_state = WaitState::SuspendedAwaitingNotify;
                    state = self.ready.wait(state).map_err(|_| BlockError::Poisoned)?;
                }
                Err(e) => {
                    state.wait_state = WaitState::Idle;
                    return Err(e);
                }
            }
        }
    }

    fn scan(&self, handles: &HandleSet) -> Result<Scan> {
        let mut all_blank = true;

        for handle in handles.iter() {
            if self.options.bypass_blank_handles && handle == BLANK_HANDLE {
                continue;
            }
            all_blank = false;

            let blockable = self
                .registry
                .get(handle)
                .ok_or_else(|| BlockError::UnknownHandle {
                    handle: handle.to_string(),
                })?;
            if !blockable.would_block(self.id) {
                return Ok(Scan::Ready(handle.to_string()));
            }
        }

        Ok(if all_blank {
            Scan::AllBlank
        } else {
            Scan::AllBlocked
        })
    }

    /// `prefix`, then OFS, then the handle found by the last `block()`.
    ///
    /// OFS and CONVFMT are read at call time.
    pub fn notifier_tag(&self) -> Result<String> {
        let result = self
            .lock()?
            .result
            .clone()
            .ok_or_else(|| BlockError::NoBlockResult {
                prefix: self.prefix.clone(),
            })?;

        // Formatting runs user-controlled CONVFMT; keep it outside the monitor.
        let convfmt = self.vars.convfmt();
        let separator = self.vars.ofs().to_awk_string(&convfmt);
        Ok(format!("{}{}{}", self.prefix, separator, result))
    }

    fn lock(&self) -> Result<MutexGuard<'_, BulkState>> {
        self.state.lock().map_err(|_| BlockError::Poisoned)
    }

    fn lock_unpoisoned(&self) -> MutexGuard<'_, BulkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BulkWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkWaiter")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("options", &self.options)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl Waiter for BulkWaiter {
    fn id(&self) -> WaiterId {
        self.id
    }

    fn block(&self) -> Result<String> {
        BulkWaiter::block(self)
    }

    fn notifier_tag(&self) -> Result<String> {
        BulkWaiter::notifier_tag(self)
    }

    fn link(&self) -> &Continuation {
        &self.link
    }
}

impl Wake for BulkWaiter {
    fn wake(&self) {
        self.notify();
    }
}
