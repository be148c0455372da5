//! Reporters read the region tree once profiling is done and render one row per node.
//!
//! Rows follow a depth-first traversal from the root, siblings in the order they were first
//! entered (or by total time, see [`ReportOrder`]). A region name that occurs at two positions of
//! the tree appears in two rows. The statistics in a row are chosen with [`ReportColumn`]s.

mod console;
mod csv;
mod json;
mod silent;

pub use self::console::*;
pub use self::csv::*;
pub use self::json::*;
pub use self::silent::*;

use std::time::Duration;

use humantime::format_duration;
use serde_derive::{Deserialize, Serialize};

use crate::error::ProfilerError;
use crate::node::{NodeId, RegionNode};
use crate::tree::RegionTree;

/// A consumer of the finished region tree.
pub trait Reporter {
    fn dump_profiler(&mut self, tree: &RegionTree) -> Result<(), ProfilerError>;
}

/// A statistic shown in a report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportColumn {
    Name,
    /// The name, indented two spaces per tree level.
    IndentedName,
    NodeId,
    ParentId,
    ParentName,
    TotalUs,
    TotalInnerUs,
    TotalSec,
    TotalInnerSec,
    /// Total time as a human-readable duration.
    Total,
    TotalInner,
    AverageUs,
    MinUs,
    MaxUs,
    Count,
    /// Total time as a percentage of the root's total time.
    PercentRuntime,
}

impl ReportColumn {
    pub const DEFAULT: [ReportColumn; 5] = [
        ReportColumn::IndentedName,
        ReportColumn::Count,
        ReportColumn::TotalUs,
        ReportColumn::TotalInnerUs,
        ReportColumn::PercentRuntime,
    ];

    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            ReportColumn::Name => "name",
            ReportColumn::IndentedName => "indented_name",
            ReportColumn::NodeId => "node_id",
            ReportColumn::ParentId => "parent_id",
            ReportColumn::ParentName => "parent_name",
            ReportColumn::TotalUs => "total_us",
            ReportColumn::TotalInnerUs => "total_inner_us",
            ReportColumn::TotalSec => "total_sec",
            ReportColumn::TotalInnerSec => "total_inner_sec",
            ReportColumn::Total => "total",
            ReportColumn::TotalInner => "total_inner",
            ReportColumn::AverageUs => "average_us",
            ReportColumn::MinUs => "min_us",
            ReportColumn::MaxUs => "max_us",
            ReportColumn::Count => "count",
            ReportColumn::PercentRuntime => "percent_runtime",
        }
    }

    /// Whether the column holds whole numbers.
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ReportColumn::NodeId
                | ReportColumn::ParentId
                | ReportColumn::TotalUs
                | ReportColumn::TotalInnerUs
                | ReportColumn::AverageUs
                | ReportColumn::MinUs
                | ReportColumn::MaxUs
                | ReportColumn::Count
        )
    }

    /// The value of this column for `node`. Missing values (the parent of the root, the average
    /// of a node that never completed) are empty strings.
    #[must_use]
    pub fn value(self, tree: &RegionTree, node: &RegionNode) -> String {
        match self {
            ReportColumn::Name => node.name().to_string(),
            ReportColumn::IndentedName => {
                format!("{}{}", "  ".repeat(tree.depth(node.id())), node.name())
            }
            ReportColumn::NodeId => node.id().to_string(),
            ReportColumn::ParentId => node
                .parent()
                .map(|parent| parent.to_string())
                .unwrap_or_default(),
            ReportColumn::ParentName => node
                .parent()
                .map(|parent| tree[parent].name().to_string())
                .unwrap_or_default(),
            ReportColumn::TotalUs => node.total().as_micros().to_string(),
            ReportColumn::TotalInnerUs => tree.inner_time(node.id()).as_micros().to_string(),
            ReportColumn::TotalSec => format!("{:.6}", node.total().as_secs_f64()),
            ReportColumn::TotalInnerSec => {
                format!("{:.6}", tree.inner_time(node.id()).as_secs_f64())
            }
            ReportColumn::Total => format_duration(node.total()).to_string(),
            ReportColumn::TotalInner => format_duration(tree.inner_time(node.id())).to_string(),
            ReportColumn::AverageUs => micros(node.average()),
            ReportColumn::MinUs => micros(node.min_interval()),
            ReportColumn::MaxUs => micros(node.max_interval()),
            ReportColumn::Count => node.call_count().to_string(),
            ReportColumn::PercentRuntime => {
                format!("{:.2}", percent_of(node.total(), tree.root().total()))
            }
        }
    }
}

fn micros(duration: Option<Duration>) -> String {
    duration
        .map(|duration| duration.as_micros().to_string())
        .unwrap_or_default()
}

fn percent_of(part: Duration, whole: Duration) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.as_secs_f64() / whole.as_secs_f64() * 100.0
}

/// Sibling order in a report.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    /// The order in which regions were first entered.
    #[default]
    Discovery,
    /// Longest total time first. Ties keep discovery order.
    TotalTime,
}

/// Report traversal: root first, depth first.
#[must_use]
pub fn traversal(tree: &RegionTree, order: ReportOrder) -> Vec<NodeId> {
    match order {
        ReportOrder::Discovery => tree.depth_first(),
        ReportOrder::TotalTime => tree.depth_first_by(|mut children| {
            // Stable sort, so ties stay in discovery order.
            children.sort_by(|a, b| tree[*b].total().cmp(&tree[*a].total()));
            children
        }),
    }
}

/// The report as a table of strings; the first row is the header.
#[must_use]
pub fn report_rows(tree: &RegionTree, columns: &[ReportColumn], order: ReportOrder) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(tree.len() + 1);
    rows.push(
        columns
            .iter()
            .map(|column| column.header().to_string())
            .collect(),
    );
    rows.extend(traversal(tree, order).into_iter().map(|id| {
        let node = &tree[id];
        columns
            .iter()
            .map(|column| column.value(tree, node))
            .collect()
    }));
    rows
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_profile;
    use super::*;

    #[test]
    fn rows_follow_discovery_order() {
        let profiler = sample_profile();
        let rows = profiler.with_tree(|tree| {
            report_rows(
                tree,
                &[
                    ReportColumn::IndentedName,
                    ReportColumn::Count,
                    ReportColumn::TotalUs,
                    ReportColumn::TotalInnerUs,
                ],
                ReportOrder::Discovery,
            )
        });

        let expected = vec![
            vec!["indented_name", "count", "total_us", "total_inner_us"],
            vec!["<main>", "1", "17000000", "3000000"],
            vec!["  a", "1", "3000000", "2000000"],
            vec!["    b", "1", "1000000", "1000000"],
            vec!["  x", "2", "10000000", "8000000"],
            vec!["    b", "2", "2000000", "2000000"],
            vec!["  g", "1", "1000000", "1000000"],
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn total_time_order_sorts_siblings() {
        let profiler = sample_profile();
        let names: Vec<String> = profiler.with_tree(|tree| {
            report_rows(tree, &[ReportColumn::Name], ReportOrder::TotalTime)
                .into_iter()
                .skip(1)
                .map(|mut row| row.remove(0))
                .collect()
        });
        assert_eq!(names, vec!["<main>", "x", "b", "a", "b", "g"]);
    }

    #[test]
    fn parent_and_interval_columns() {
        let profiler = sample_profile();
        profiler.with_tree(|tree| {
            let x_b = tree.find_path(&["x", "b"]).unwrap();
            assert_eq!(ReportColumn::ParentName.value(tree, x_b), "x");
            assert_eq!(
                ReportColumn::ParentId.value(tree, x_b),
                tree.find_path(&["x"]).unwrap().id().to_string()
            );
            assert_eq!(ReportColumn::AverageUs.value(tree, x_b), "1000000");
            assert_eq!(ReportColumn::MinUs.value(tree, x_b), "1000000");
            assert_eq!(ReportColumn::Total.value(tree, x_b), "2s");
            assert_eq!(ReportColumn::TotalSec.value(tree, x_b), "2.000000");

            let root = tree.root();
            assert_eq!(ReportColumn::ParentId.value(tree, root), "");
            assert_eq!(ReportColumn::PercentRuntime.value(tree, root), "100.00");
        });
    }

    #[test]
    fn never_completed_node_has_no_average() {
        let profiler = crate::RegionProfiler::with_clock(std::sync::Arc::new(
            crate::clock::TickClock::new(),
        ));
        profiler.region("a").cancel();
        profiler.with_tree(|tree| {
            let a = tree.find_path(&["a"]).unwrap();
            assert_eq!(ReportColumn::AverageUs.value(tree, a), "");
            assert_eq!(ReportColumn::Count.value(tree, a), "0");
            assert_eq!(ReportColumn::PercentRuntime.value(tree, a), "0.00");
        });
    }

    #[test]
    fn columns_deserialize_from_snake_case() {
        let columns: Vec<ReportColumn> =
            serde_json::from_str(r#"["indented_name", "total_inner_us", "percent_runtime"]"#)
                .unwrap();
        assert_eq!(
            columns,
            vec![
                ReportColumn::IndentedName,
                ReportColumn::TotalInnerUs,
                ReportColumn::PercentRuntime
            ]
        );
        for column in columns {
            assert_eq!(
                serde_json::to_string(&column).unwrap(),
                format!("\"{}\"", column.header())
            );
        }
    }
}
