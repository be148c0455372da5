use std::sync::{Arc, Mutex, PoisonError};

use super::{report_rows, ReportColumn, ReportOrder, Reporter};
use crate::error::ProfilerError;
use crate::tree::RegionTree;

/// Prints nothing. The rows of the last dump are kept and can be read through a handle obtained
/// with [`SilentReporter::rows`], which stays valid after the reporter is boxed away.
#[derive(Debug, Clone)]
pub struct SilentReporter {
    columns: Vec<ReportColumn>,
    order: ReportOrder,
    rows: Arc<Mutex<Vec<Vec<String>>>>,
}

impl SilentReporter {
    #[must_use]
    pub fn new(columns: Vec<ReportColumn>, order: ReportOrder) -> Self {
        Self {
            columns,
            order,
            rows: Arc::default(),
        }
    }

    /// Shared handle to the rows of the last dump, header first. Empty until the first dump.
    #[must_use]
    pub fn rows(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.rows)
    }
}

impl Default for SilentReporter {
    fn default() -> Self {
        Self::new(ReportColumn::DEFAULT.to_vec(), ReportOrder::default())
    }
}

impl Reporter for SilentReporter {
    fn dump_profiler(&mut self, tree: &RegionTree) -> Result<(), ProfilerError> {
        let rows = report_rows(tree, &self.columns, self.order);
        *self.rows.lock().unwrap_or_else(PoisonError::into_inner) = rows;
        Ok(())
    }
}
