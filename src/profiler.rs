use std::marker::PhantomData;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use log::{debug, error, trace, warn};

use crate::callsite::callsite_name;
use crate::clock::{Clock, MonotonicClock};
use crate::config::ProfilerConfig;
use crate::error::ProfilerError;
use crate::iter::ProfiledIter;
use crate::listener::{notify_all, ChromeTraceListener, DebugListener, RegionListener};
use crate::node::NodeId;
use crate::report::Reporter;
use crate::stack::ActiveStack;
use crate::tree::RegionTree;

struct EngineState {
    tree: RegionTree,
    stack: ActiveStack,
    listeners: Vec<Box<dyn RegionListener>>,
    finalized: bool,
}

/// The region tree engine.
///
/// The root region is entered when the profiler is constructed and exited by
/// [`RegionProfiler::finalize`]. Regions are entered through scoped [`RegionGuard`]s, which
/// close their region on every exit path, and through [`ProfiledIter`], which times each pull
/// of a wrapped iterator.
///
/// A profiler records regions from the thread that created it only. Entries from other threads
/// receive an inert guard, and a warning is logged once.
pub struct RegionProfiler {
    state: Mutex<EngineState>,
    owner: ThreadId,
    foreign_thread_warned: AtomicBool,
}

impl RegionProfiler {
    /// A profiler timed by the monotonic wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_listeners(clock, Vec::new())
    }

    #[must_use]
    pub fn with_listeners(clock: Arc<dyn Clock>, listeners: Vec<Box<dyn RegionListener>>) -> Self {
        let mut tree = RegionTree::new(clock);
        if let Err(error) = tree.get_mut(NodeId::ROOT).enter() {
            error!("could not start the root region: {error}");
        }
        trace!("region profiler created");
        Self {
            state: Mutex::new(EngineState {
                tree,
                stack: ActiveStack::new(),
                listeners,
                finalized: false,
            }),
            owner: thread::current().id(),
            foreign_thread_warned: AtomicBool::new(false),
        }
    }

    /// Builds a profiler with the listeners requested by `config`. A listener that cannot be
    /// created is logged and left out.
    #[must_use]
    pub fn from_config(config: &ProfilerConfig) -> Self {
        let mut listeners: Vec<Box<dyn RegionListener>> = Vec::new();
        if let Some(path) = &config.chrome_trace_file {
            match ChromeTraceListener::create(path) {
                Ok(listener) => listeners.push(Box::new(listener)),
                Err(error) => error!(
                    "could not create chrome trace file {}: {error}",
                    path.display()
                ),
            }
        }
        if config.debug {
            listeners.push(Box::new(DebugListener::new()));
        }
        let clock = config
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        Self::with_listeners(clock, listeners)
    }

    pub fn add_listener(&self, listener: Box<dyn RegionListener>) {
        self.lock().listeners.push(listener);
    }

    // A listener that panicked while the lock was held leaves valid state behind; profiling
    // must not turn that into a second panic in the profiled program.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_owner_thread(&self) -> bool {
        if thread::current().id() == self.owner {
            return true;
        }
        if !self.foreign_thread_warned.swap(true, Ordering::Relaxed) {
            warn!("regions entered from a thread other than the profiler's owner are not recorded");
        }
        false
    }

    /// Enters the region `name` below the innermost open region.
    #[track_caller]
    pub fn region(&self, name: &str) -> RegionGuard<'_> {
        self.enter_region(Some(name), false)
    }

    /// Enters the global region `name`, which is always a child of the root.
    #[track_caller]
    pub fn global_region(&self, name: &str) -> RegionGuard<'_> {
        self.enter_region(Some(name), true)
    }

    /// Enters a region named after the call site.
    #[track_caller]
    pub fn auto_region(&self) -> RegionGuard<'_> {
        self.enter_region(None, false)
    }

    /// Enters a region and returns the guard that exits it. Without a name, the region is named
    /// after the call site.
    #[track_caller]
    pub fn enter_region(&self, name: Option<&str>, as_global: bool) -> RegionGuard<'_> {
        match self.enter(name, Location::caller(), as_global) {
            Some(node) => RegionGuard::new(self, node, DropAction::Exit),
            None => RegionGuard::inert(),
        }
    }

    /// Wraps `iterable` so that producing each element is timed as the region `name`.
    #[track_caller]
    pub fn iter_wrap<I: IntoIterator>(
        &self,
        iterable: I,
        name: Option<&str>,
        as_global: bool,
    ) -> ProfiledIter<'_, I::IntoIter> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.callsite_region_name(Location::caller(), as_global),
        };
        ProfiledIter::new(self, iterable.into_iter(), name, as_global)
    }

    fn callsite_region_name(&self, location: &Location<'_>, as_global: bool) -> String {
        let state = self.lock();
        let parent = state.stack.resolve_parent(as_global);
        callsite_name(state.tree[parent].name(), location)
    }

    /// Opens a region and notifies listeners. Returns `None` when nothing was recorded.
    pub(crate) fn enter(
        &self,
        name: Option<&str>,
        location: &Location<'_>,
        as_global: bool,
    ) -> Option<NodeId> {
        if !self.on_owner_thread() {
            return None;
        }
        let mut state = self.lock();
        if state.finalized {
            warn!("region entered after the profiler was finalized; not recorded");
            return None;
        }
        let EngineState {
            tree,
            stack,
            listeners,
            ..
        } = &mut *state;

        let parent = stack.resolve_parent(as_global);
        let id = match name {
            Some(name) => tree.get_or_create(parent, name, as_global),
            None => {
                let name = callsite_name(tree[parent].name(), location);
                tree.get_or_create(parent, &name, as_global)
            }
        };
        if let Err(error) = tree.get_mut(id).enter() {
            error!("could not enter region `{}`: {error}", tree[id].name());
            return None;
        }
        stack.push(id);

        let node = &tree[id];
        notify_all(listeners, |listener| listener.region_entered(tree, node));
        Some(id)
    }

    /// Completes the open region `id`.
    pub(crate) fn exit(&self, id: NodeId) {
        let mut state = self.lock();
        if state.finalized {
            return;
        }
        let EngineState {
            tree,
            stack,
            listeners,
            ..
        } = &mut *state;

        match stack.pop(id) {
            Ok(()) => {
                if let Err(error) = tree.get_mut(id).exit() {
                    error!("could not exit region `{}`: {error}", tree[id].name());
                    return;
                }
                let node = &tree[id];
                notify_all(listeners, |listener| listener.region_exited(tree, node));
            }
            Err(mismatch) => {
                error!(
                    "region `{}` exited out of order ({mismatch}); its interval is discarded",
                    tree[id].name()
                );
                Self::abandon(tree, stack, listeners, id);
            }
        }
    }

    /// Discards the open interval of region `id` without counting it.
    pub(crate) fn cancel(&self, id: NodeId) {
        let mut state = self.lock();
        if state.finalized {
            return;
        }
        let EngineState {
            tree,
            stack,
            listeners,
            ..
        } = &mut *state;

        if let Err(mismatch) = stack.pop(id) {
            error!(
                "region `{}` canceled out of order ({mismatch})",
                tree[id].name()
            );
            Self::abandon(tree, stack, listeners, id);
            return;
        }
        Self::cancel_node(tree, listeners, id);
    }

    /// Cancels `id` and every region opened inside it, innermost first. A child never keeps
    /// running after its parent has stopped.
    fn abandon(
        tree: &mut RegionTree,
        stack: &mut ActiveStack,
        listeners: &mut [Box<dyn RegionListener>],
        id: NodeId,
    ) {
        let Some(abandoned) = stack.unwind(id) else {
            return;
        };
        for node in abandoned {
            if node != id {
                warn!(
                    "region `{}` is still open inside `{}`; its interval is discarded",
                    tree[node].name(),
                    tree[id].name()
                );
            }
            Self::cancel_node(tree, listeners, node);
        }
    }

    fn cancel_node(tree: &mut RegionTree, listeners: &mut [Box<dyn RegionListener>], id: NodeId) {
        if let Err(error) = tree.get_mut(id).cancel() {
            error!("could not cancel region `{}`: {error}", tree[id].name());
            return;
        }
        let node = &tree[id];
        notify_all(listeners, |listener| listener.region_canceled(tree, node));
    }

    /// Ends profiling: regions still open are canceled, the root region is exited and every
    /// listener is finalized. May be called once; later calls return
    /// [`ProfilerError::AlreadyFinalized`].
    pub fn finalize(&self) -> Result<(), ProfilerError> {
        let mut state = self.lock();
        if state.finalized {
            warn!("region profiler finalized more than once");
            return Err(ProfilerError::AlreadyFinalized);
        }
        let EngineState {
            tree,
            stack,
            listeners,
            finalized,
        } = &mut *state;
        *finalized = true;

        while stack.top() != NodeId::ROOT {
            let id = stack.top();
            warn!(
                "region `{}` is still open at finalize; its interval is discarded",
                tree[id].name()
            );
            // `id` is the top of the stack, so the pop cannot fail.
            let _ = stack.pop(id);
            Self::cancel_node(tree, listeners, id);
        }
        if let Err(error) = tree.get_mut(NodeId::ROOT).exit() {
            error!("could not stop the root region: {error}");
        }
        notify_all(listeners, |listener| listener.finalize());
        debug!("region profiler finalized with {} regions", tree.len());
        Ok(())
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.lock().finalized
    }

    /// Runs `f` with read access to the region tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&RegionTree) -> R) -> R {
        f(&self.lock().tree)
    }

    /// The innermost open region, or the root.
    #[must_use]
    pub fn current_region(&self) -> NodeId {
        self.lock().stack.top()
    }

    /// Hands the tree to `reporter`.
    pub fn report(&self, reporter: &mut dyn Reporter) -> Result<(), ProfilerError> {
        let state = self.lock();
        if !state.finalized {
            debug!("reporting before finalize; open intervals are not included");
        }
        reporter.dump_profiler(&state.tree)
    }
}

impl Default for RegionProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropAction {
    Exit,
    Cancel,
}

/// An open region. Dropping the guard exits the region, on normal return, early return or
/// unwinding alike.
///
/// The guard must be dropped on the thread that created it.
#[must_use = "the region is exited as soon as the guard is dropped"]
pub struct RegionGuard<'a> {
    profiler: Option<&'a RegionProfiler>,
    node: NodeId,
    on_drop: DropAction,
    _not_send: PhantomData<*const ()>,
}

impl<'a> RegionGuard<'a> {
    pub(crate) fn new(profiler: &'a RegionProfiler, node: NodeId, on_drop: DropAction) -> Self {
        Self {
            profiler: Some(profiler),
            node,
            on_drop,
            _not_send: PhantomData,
        }
    }

    /// A guard that records nothing.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            profiler: None,
            node: NodeId::ROOT,
            on_drop: DropAction::Exit,
            _not_send: PhantomData,
        }
    }

    /// The node being timed, unless the guard is inert.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.profiler.map(|_| self.node)
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.profiler.is_some()
    }

    /// Exits the region now. Equivalent to dropping the guard.
    pub fn exit(mut self) {
        self.on_drop = DropAction::Exit;
    }

    /// Discards the region's open interval: it does not count as a call and its time is not
    /// added to the region.
    pub fn cancel(mut self) {
        self.on_drop = DropAction::Cancel;
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        if let Some(profiler) = self.profiler.take() {
            match self.on_drop {
                DropAction::Exit => profiler.exit(self.node),
                DropAction::Cancel => profiler.cancel(self.node),
            }
        }
    }
}
