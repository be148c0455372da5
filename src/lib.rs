//! An in-process call-tree profiler for named code regions.
//!
//! Application code marks *regions*: function bodies, loop bodies, the production of each element
//! of an iterator. The profiler aggregates every entry of a region at one position of the call
//! tree into a single node, which records:
//! * the number of completed entries,
//! * the total wall-clock time spent in them,
//! * the inner time, which excludes the time of child regions.
//!
//! Nested regions become children of the innermost open region. A *global* region is always a
//! child of the root and aggregates every call site that enters it, whatever the caller's
//! position in the tree.
//!
//! ```rust
//! use region_profiler::RegionProfiler;
//!
//! let profiler = RegionProfiler::new();
//! {
//!     let _load = profiler.region("load");
//!     for record in profiler.iter_wrap(vec![1, 2, 3], Some("next record"), false) {
//!         let _parse = profiler.region("parse");
//!         let _ = record;
//!     }
//! }
//! profiler.finalize().unwrap();
//! profiler.with_tree(|tree| {
//!     let parse = tree.find_path(&["load", "parse"]).unwrap();
//!     assert_eq!(parse.call_count(), 3);
//! });
//! ```
//!
//! Listeners ([`listener`]) observe transitions as they happen, for example to write a Chrome
//! trace. Reporters ([`report`]) render the finished tree. The [`global`] module holds a
//! process-wide instance with free-function and macro entry points.
pub mod callsite;
pub mod clock;
pub mod config;
pub mod error;
pub mod global;
pub mod iter;
pub mod listener;
pub mod log;
pub mod node;
pub mod profiler;
pub mod report;
pub mod stack;
pub mod timer;
pub mod tree;

pub use clock::{Clock, MonotonicClock, TickClock};
pub use config::{ProfilerConfig, ReportFormat, ReportOptions};
pub use error::ProfilerError;
pub use global::{auto_region, global_region, install, installed, iter_proxy, region};
pub use iter::ProfiledIter;
pub use listener::{ChromeTraceListener, DebugListener, RegionListener};
pub use node::{NodeId, RegionNode};
pub use profiler::{RegionGuard, RegionProfiler};
pub use report::{
    report_rows, ConsoleReporter, CsvReporter, JsonReporter, ReportColumn, ReportOrder, Reporter,
    SilentReporter,
};
pub use tree::{RegionTree, ROOT_NODE_NAME};

pub(crate) type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
