use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use serde_derive::Serialize;

use crate::clock::Clock;
use crate::error::ProfilerError;
use crate::timer::Timer;
use crate::HashMap;

/// Index of a node in its [`RegionTree`](crate::RegionTree). Ids are assigned in creation order;
/// the root is always `NodeId(0)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persistent tree vertex aggregating every occurrence of one region at one tree position.
#[derive(Debug)]
pub struct RegionNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    // Every child in first-discovery order, global children of the root included.
    pub(crate) children: Vec<NodeId>,
    // Name lookup for non-global children. Global nodes are found through the tree's registry.
    pub(crate) child_index: HashMap<String, NodeId>,
    pub(crate) is_global: bool,
    pub(crate) timer: Timer,
    pub(crate) call_count: usize,
    // How many times the node is currently open on the active stack. Greater than one only for
    // reentrant global regions.
    pub(crate) depth: usize,
    pub(crate) min_interval: Option<Duration>,
    pub(crate) max_interval: Option<Duration>,
    pub(crate) last_transition_ts: Duration,
}

impl RegionNode {
    pub(crate) fn new(
        id: NodeId,
        name: String,
        parent: Option<NodeId>,
        is_global: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            name,
            parent,
            children: Vec::new(),
            child_index: HashMap::default(),
            is_global,
            timer: Timer::new(clock),
            call_count: 0,
            depth: 0,
            min_interval: None,
            max_interval: None,
            last_transition_ts: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in first-discovery order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().copied()
    }

    /// The non-global child called `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.child_index.get(name).copied()
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Number of completed, non-canceled entries.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count
    }

    /// Total time of all completed intervals.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.timer.elapsed()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    #[must_use]
    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    #[must_use]
    pub fn max_interval(&self) -> Option<Duration> {
        self.max_interval
    }

    /// Mean duration of a completed entry.
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        let count = u32::try_from(self.call_count).ok()?;
        if count == 0 {
            return None;
        }
        Some(self.total() / count)
    }

    /// Timestamp of the latest enter, exit or cancel of this node.
    #[must_use]
    pub fn last_transition_ts(&self) -> Duration {
        self.last_transition_ts
    }

    /// Opens one activation of the node. The timer only starts for the outermost activation.
    pub(crate) fn enter(&mut self) -> Result<(), ProfilerError> {
        if self.depth == 0 {
            self.timer.start()?;
            self.last_transition_ts = self.timer.begin_ts();
        } else {
            self.last_transition_ts = self.timer.now();
        }
        self.depth += 1;
        Ok(())
    }

    /// Completes one activation of the node.
    pub(crate) fn exit(&mut self) -> Result<(), ProfilerError> {
        if self.depth == 0 {
            return Err(ProfilerError::TimerNotRunning);
        }
        self.depth -= 1;
        if self.depth == 0 {
            let interval = self.timer.stop()?;
            self.last_transition_ts = self.timer.end_ts();
            self.min_interval = Some(self.min_interval.map_or(interval, |min| min.min(interval)));
            self.max_interval = Some(self.max_interval.map_or(interval, |max| max.max(interval)));
        } else {
            self.last_transition_ts = self.timer.now();
        }
        self.call_count += 1;
        Ok(())
    }

    /// Abandons one activation of the node. The interval is not counted.
    pub(crate) fn cancel(&mut self) -> Result<(), ProfilerError> {
        if self.depth == 0 {
            return Err(ProfilerError::TimerNotRunning);
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.timer.cancel()?;
            self.last_transition_ts = self.timer.end_ts();
        } else {
            self.last_transition_ts = self.timer.now();
        }
        Ok(())
    }
}
