use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use rustc_hash::FxHasher;
use serde_derive::Serialize;

use super::RegionListener;
use crate::error::ProfilerError;
use crate::node::{NodeId, RegionNode};
use crate::tree::RegionTree;

#[derive(Serialize)]
struct TraceEvent<'a> {
    name: &'a str,
    ph: &'static str,
    ts: u64,
    pid: u32,
    tid: u64,
}

/// A begin event that has not been written yet.
#[derive(Debug)]
struct PendingBegin {
    node: NodeId,
    name: String,
    ts: Duration,
}

/// Streams a JSON array of trace events (`"ph": "B"` / `"E"`, timestamps in microseconds).
///
/// Begin events are held back until the next transition. A region that is canceled right after
/// it was entered, such as the final pull of an exhausted iterator, thus leaves no trace at all.
/// If a canceled region already had its begin event written, an end event closes it so the
/// trace stays balanced.
pub struct ChromeTraceListener<W: Write + Send = BufWriter<File>> {
    out: W,
    path: Option<PathBuf>,
    need_comma: bool,
    pending_begin: Option<PendingBegin>,
    pid: u32,
    tid: u64,
    finalized: bool,
}

impl ChromeTraceListener<BufWriter<File>> {
    /// Creates (or truncates) the trace file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ProfilerError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut listener = Self::new(BufWriter::new(file))?;
        listener.path = Some(path.to_path_buf());
        Ok(listener)
    }
}

impl<W: Write + Send> ChromeTraceListener<W> {
    /// Starts a trace on `out`. The opening bracket is written immediately.
    pub fn new(mut out: W) -> Result<Self, ProfilerError> {
        out.write_all(b"[")?;
        Ok(Self {
            out,
            path: None,
            need_comma: false,
            pending_begin: None,
            pid: std::process::id(),
            tid: current_thread_id(),
            finalized: false,
        })
    }

    /// The trace file, if the listener writes to one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn flush_pending_begin(&mut self) -> Result<(), ProfilerError> {
        if let Some(pending) = self.pending_begin.take() {
            self.write_event(&pending.name, "B", pending.ts)?;
        }
        Ok(())
    }

    fn write_event(&mut self, name: &str, ph: &'static str, ts: Duration) -> Result<(), ProfilerError> {
        if self.need_comma {
            self.out.write_all(b",")?;
        } else {
            self.need_comma = true;
        }
        let event = TraceEvent {
            name,
            ph,
            ts: u64::try_from(ts.as_micros()).unwrap_or(u64::MAX),
            pid: self.pid,
            tid: self.tid,
        };
        serde_json::to_writer(&mut self.out, &event)?;
        Ok(())
    }
}

impl<W: Write + Send> RegionListener for ChromeTraceListener<W> {
    fn name(&self) -> &str {
        "chrome trace"
    }

    fn region_entered(&mut self, _tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        self.flush_pending_begin()?;
        self.pending_begin = Some(PendingBegin {
            node: node.id(),
            name: node.name().to_string(),
            ts: node.last_transition_ts(),
        });
        Ok(())
    }

    fn region_exited(&mut self, _tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        self.flush_pending_begin()?;
        self.write_event(node.name(), "E", node.last_transition_ts())
    }

    fn region_canceled(&mut self, _tree: &RegionTree, node: &RegionNode) -> Result<(), ProfilerError> {
        match self.pending_begin.take() {
            Some(pending) if pending.node == node.id() => Ok(()),
            other => {
                self.pending_begin = other;
                self.flush_pending_begin()?;
                self.write_event(node.name(), "E", node.last_transition_ts())
            }
        }
    }

    fn finalize(&mut self) -> Result<(), ProfilerError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.flush_pending_begin()?;
        self.out.write_all(b"]")?;
        self.out.flush()?;
        if let Some(path) = &self.path {
            info!("chrome trace saved at {}", path.display());
        }
        Ok(())
    }
}

/// A numeric id for the current thread, stable for the life of the process.
fn current_thread_id() -> u64 {
    let mut hasher = FxHasher::default();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}
