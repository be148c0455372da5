use std::io::{self, Write};

use super::{report_rows, ReportColumn, ReportOrder, Reporter};
use crate::error::ProfilerError;
use crate::tree::RegionTree;

/// Prints the report as an aligned table.
pub struct ConsoleReporter {
    columns: Vec<ReportColumn>,
    order: ReportOrder,
    out: Box<dyn Write + Send>,
}

impl ConsoleReporter {
    /// A reporter printing to standard output.
    #[must_use]
    pub fn new(columns: Vec<ReportColumn>, order: ReportOrder) -> Self {
        Self::with_writer(columns, order, Box::new(io::stdout()))
    }

    #[must_use]
    pub fn with_writer(
        columns: Vec<ReportColumn>,
        order: ReportOrder,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            columns,
            order,
            out,
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(ReportColumn::DEFAULT.to_vec(), ReportOrder::default())
    }
}

impl Reporter for ConsoleReporter {
    fn dump_profiler(&mut self, tree: &RegionTree) -> Result<(), ProfilerError> {
        let mut rows = report_rows(tree, &self.columns, self.order);
        for row in rows.iter_mut().skip(1) {
            for (cell, column) in row.iter_mut().zip(&self.columns) {
                if column.is_integer() {
                    if let Ok(value) = cell.parse::<u128>() {
                        *cell = format_with_commas(value);
                    }
                } else if *column == ReportColumn::PercentRuntime {
                    cell.push('%');
                }
            }
        }
        writeln!(self.out)?;
        write_formatted_table(&mut self.out, &rows)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes a table with aligned columns, using the first row as a header.
/// The first column is left-aligned; remaining columns are right-aligned.
/// Automatically adjusts column widths and inserts a separator line.
pub fn write_formatted_table<W: Write + ?Sized>(out: &mut W, rows: &[Vec<String>]) -> io::Result<()> {
    if rows.len() < 2 {
        return Ok(());
    }

    let num_cols = rows[0].len();
    let mut col_widths = vec![0; num_cols];

    // Compute max column widths
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }

    write_row(out, &rows[0], &col_widths)?;

    let total_width: usize = col_widths.iter().map(|w| *w + 2).sum();
    writeln!(out, "{}", "-".repeat(total_width))?;

    for row in &rows[1..] {
        write_row(out, row, &col_widths)?;
    }
    Ok(())
}

fn write_row<W: Write + ?Sized>(out: &mut W, row: &[String], col_widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (i, cell) in row.iter().enumerate() {
        if i == 0 {
            line.push_str(&format!("{:<width$} ", cell, width = col_widths[i] + 1));
        } else {
            line.push_str(&format!("{:>width$} ", cell, width = col_widths[i] + 1));
        }
    }
    writeln!(out, "{}", line.trim_end())
}

/// Formats an integer with thousands separator.
#[must_use]
pub fn format_with_commas(value: u128) -> String {
    let s = value.to_string();
    let mut result = String::new();
    let bytes = s.as_bytes();
    let len = bytes.len();

    for (i, &b) in bytes.iter().enumerate() {
        result.push(b as char);
        let digits_left = len - i - 1;
        if digits_left > 0 && digits_left.is_multiple_of(3) {
            result.push(',');
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::test_support::SharedBuffer;
    use crate::report::test_support::sample_profile;

    #[test]
    fn formats_single_digit() {
        assert_eq!(format_with_commas(7), "7");
    }

    #[test]
    fn formats_three_digits() {
        assert_eq!(format_with_commas(999), "999");
    }

    #[test]
    fn formats_four_digits() {
        assert_eq!(format_with_commas(1000), "1,000");
    }

    #[test]
    fn formats_seven_digits() {
        assert_eq!(format_with_commas(1_000_000), "1,000,000");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_with_commas(0), "0");
    }

    #[test]
    fn formats_large_number() {
        assert_eq!(format_with_commas(9_876_543_210), "9,876,543,210");
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["name".to_string(), "count".to_string()],
            vec!["<main>".to_string(), "1".to_string()],
            vec!["  a".to_string(), "12".to_string()],
        ];
        let mut out = Vec::new();
        write_formatted_table(&mut out, &rows).unwrap();
        let expected = "\
name     count
---------------
<main>       1
  a         12
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn header_only_table_prints_nothing() {
        let mut out = Vec::new();
        write_formatted_table(&mut out, &[vec!["name".to_string()]]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn console_report_formats_numbers() {
        let profiler = sample_profile();
        let buffer = SharedBuffer::default();
        let mut reporter = ConsoleReporter::with_writer(
            vec![
                ReportColumn::IndentedName,
                ReportColumn::TotalUs,
                ReportColumn::PercentRuntime,
            ],
            ReportOrder::Discovery,
            Box::new(buffer.clone()),
        );
        profiler.report(&mut reporter).unwrap();

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("indented_name"));
        assert!(lines[3].starts_with("<main>"));
        assert!(lines[3].contains("17,000,000"));
        assert!(lines[3].ends_with("100.00%"));
        assert!(lines[4].starts_with("  a"));
        assert_eq!(lines.len(), 9);
    }
}
