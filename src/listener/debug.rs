use std::io::{self, Write};

use humantime::format_duration;

use super::RegionListener;
use crate::error::ProfilerError;
use crate::node::RegionNode;
use crate::tree::RegionTree;

const PREFIX: &str = "RegionProfiler:";

/// Writes a line for every transition, with times relative to the start of the root region.
/// Exits also show the region's accumulated time.
pub struct DebugListener {
    out: Box<dyn Write + Send>,
}

impl DebugListener {
    /// A listener writing to standard error.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

impl Default for DebugListener {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionListener for DebugListener {
    fn name(&self) -> &str {
        "debug"
    }

    fn region_entered(&mut self, tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        let ts = node
            .last_transition_ts()
            .saturating_sub(tree.root().timer().begin_ts());
        writeln!(
            self.out,
            "{PREFIX} Entered {} at {}",
            node.name(),
            format_duration(ts)
        )?;
        Ok(())
    }

    fn region_exited(&mut self, tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        let ts = node
            .last_transition_ts()
            .saturating_sub(tree.root().timer().begin_ts());
        writeln!(
            self.out,
            "{PREFIX} Exited {} at {} after {}",
            node.name(),
            format_duration(ts),
            format_duration(node.timer().elapsed())
        )?;
        Ok(())
    }

    fn region_canceled(&mut self, tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        let ts = node
            .last_transition_ts()
            .saturating_sub(tree.root().timer().begin_ts());
        writeln!(
            self.out,
            "{PREFIX} Canceled {} at {}",
            node.name(),
            format_duration(ts)
        )?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ProfilerError> {
        writeln!(self.out, "{PREFIX} Finalizing profiler")?;
        self.out.flush()?;
        Ok(())
    }
}
