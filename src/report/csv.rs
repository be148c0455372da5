use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use ::csv::Writer;
use log::info;

use super::{report_rows, ReportColumn, ReportOrder, Reporter};
use crate::error::ProfilerError;
use crate::tree::RegionTree;

/// Writes the report to a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
    columns: Vec<ReportColumn>,
    order: ReportOrder,
}

impl CsvReporter {
    pub fn new<P: AsRef<Path>>(path: P, columns: Vec<ReportColumn>, order: ReportOrder) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            columns,
            order,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for CsvReporter {
    fn dump_profiler(&mut self, tree: &RegionTree) -> Result<(), ProfilerError> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let mut writer = Writer::from_path(&self.path)?;
        for row in report_rows(tree, &self.columns, self.order) {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        info!("profile report saved at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::report::test_support::sample_profile;

    #[test]
    fn writes_header_and_one_record_per_node() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("profile.csv");
        let profiler = sample_profile();
        let mut reporter = CsvReporter::new(
            &path,
            vec![ReportColumn::Name, ReportColumn::ParentName, ReportColumn::Count],
            ReportOrder::Discovery,
        );
        profiler.report(&mut reporter).unwrap();

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, vec!["name", "parent_name", "count"]);

        let records: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0], vec!["<main>", "", "1"]);
        assert_eq!(records[4], vec!["b", "x", "2"]);
    }
}
