use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use log::info;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{traversal, ReportColumn, ReportOrder, Reporter};
use crate::error::ProfilerError;
use crate::tree::RegionTree;

/// A wrapper around Duration the serialization format of which we have control over.
#[derive(Debug, Copy, Clone)]
struct SerializableDuration(Duration);

impl Serialize for SerializableDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

#[derive(Serialize)]
struct ProfileRecord {
    date_time: SystemTime,
    total_runtime: SerializableDuration,
    rows: Vec<IndexMap<&'static str, Value>>,
}

/// Writes the report to a JSON file: `{"date_time", "total_runtime", "rows": [{column: value}]}`.
///
/// Whole-number columns are written as numbers, second and percentage columns as floats, missing
/// values as `null`.
#[derive(Debug, Clone)]
pub struct JsonReporter {
    path: PathBuf,
    columns: Vec<ReportColumn>,
    order: ReportOrder,
}

impl JsonReporter {
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

fn json_value(column: ReportColumn, value: String) -> Value {
    if value.is_empty() && column != ReportColumn::Name {
        return Value::Null;
    }
    match column {
        column if column.is_integer() => value.parse::<u64>().map_or(Value::String(value), Value::from),
        ReportColumn::TotalSec | ReportColumn::TotalInnerSec | ReportColumn::PercentRuntime => {
            value.parse::<f64>().map_or(Value::String(value), Value::from)
        }
        _ => Value::String(value),
    }
}

impl Reporter for JsonReporter {
    fn dump_profiler(&mut self, tree: &RegionTree) -> Result<(), ProfilerError> {
        let rows: Vec<IndexMap<&'static str, Value>> = traversal(tree, self.order)
            .into_iter()
            .map(|id| {
                let node = &tree[id];
                self.columns
                    .iter()
                    .map(|&column| (column.header(), json_value(column, column.value(tree, node))))
                    .collect()
            })
            .collect();
        let record = ProfileRecord {
            date_time: SystemTime::now(),
            total_runtime: SerializableDuration(tree.root().total()),
            rows,
        };

        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &record)?;
        writer.flush()?;
        info!("profile report saved at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::report::test_support::sample_profile;

    #[test]
    fn writes_typed_rows() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");
        let profiler = sample_profile();
        let mut reporter = JsonReporter::new(
            &path,
            vec![
                ReportColumn::Name,
                ReportColumn::ParentId,
                ReportColumn::Count,
                ReportColumn::TotalUs,
                ReportColumn::TotalSec,
            ],
            ReportOrder::Discovery,
        );
        profiler.report(&mut reporter).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: Value = serde_json::from_str(&content).expect("Invalid JSON");

        assert!(json.get("date_time").is_some());
        assert_approx_eq!(json["total_runtime"].as_f64().unwrap(), 17.0);

        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["name"], "<main>");
        assert_eq!(rows[0]["parent_id"], Value::Null);
        assert_eq!(rows[3]["name"], "x");
        assert_eq!(rows[3]["count"], 2);
        assert_eq!(rows[3]["total_us"], 10_000_000);
        assert_approx_eq!(rows[3]["total_sec"].as_f64().unwrap(), 10.0);
    }

    #[test]
    fn columns_keep_their_order() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");
        let profiler = sample_profile();
        let mut reporter = JsonReporter::new(
            &path,
            vec![ReportColumn::Count, ReportColumn::Name],
            ReportOrder::Discovery,
        );
        profiler.report(&mut reporter).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let count_at = content.find("\"count\"").unwrap();
        let name_at = content.find("\"name\"").unwrap();
        assert!(count_at < name_at);
    }
}
