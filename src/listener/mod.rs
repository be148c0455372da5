//! Listeners observe region transitions as they happen.
//!
//! Hooks are called synchronously, on the thread that caused the transition, while the profiler
//! holds its internal lock. A listener must therefore not enter or exit regions itself. A hook
//! that returns an error is logged and skipped; the remaining listeners are still notified and
//! the profiled program is unaffected.
//!
//! Two listeners are provided:
//! - [`ChromeTraceListener`] streams begin/end events in the Chrome trace event format, loadable
//!   in `chrome://tracing` or <https://ui.perfetto.dev/>.
//! - [`DebugListener`] writes one human-readable line per transition.

mod chrome_trace;
mod debug;

pub use chrome_trace::*;
pub use debug::*;

use crate::error::ProfilerError;
use crate::node::RegionNode;
use crate::tree::RegionTree;

pub trait RegionListener: Send {
    /// A short name used in log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// `node` has just been entered and is now the innermost open region.
    fn region_entered(&mut self, tree: &RegionTree, node: &RegionNode)
        -> Result<(), ProfilerError>;

    /// `node` completed normally.
    fn region_exited(&mut self, tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError>;

    /// `node`'s open interval was discarded. A listener holding an unemitted begin event for
    /// this node must drop it.
    fn region_canceled(&mut self, tree: &RegionTree, node: &RegionNode)
        -> Result<(), ProfilerError>;

    /// The profiler is shutting down. Called exactly once; owned resources should be flushed
    /// and closed.
    fn finalize(&mut self) -> Result<(), ProfilerError>;
}

/// Calls `hook` on every listener, logging and containing failures.
pub(crate) fn notify_all<F>(listeners: &mut [Box<dyn RegionListener>], mut hook: F)
where
    F: FnMut(&mut dyn RegionListener) -> Result<(), ProfilerError>,
{
    for listener in listeners.iter_mut() {
        if let Err(error) = hook(listener.as_mut()) {
            log::error!("region listener `{}` failed: {error}", listener.name());
        }
    }
}
