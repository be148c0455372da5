//! Profiler configuration: which listeners to attach and how the final report is written.
//!
//! A configuration can be built in code with the setter methods, or loaded from a JSON file in
//! which every field is optional:
//!
//! ```json
//! {
//!     "chrome_trace_file": "trace.json",
//!     "debug": false,
//!     "report": {
//!         "format": "csv",
//!         "output_dir": "output",
//!         "file_prefix": "run1_",
//!         "overwrite": true,
//!         "columns": ["indented_name", "count", "total_us", "total_inner_us"],
//!         "order": "total_time"
//!     }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_derive::Deserialize;

use crate::clock::Clock;
use crate::error::ProfilerError;
use crate::report::{
    ConsoleReporter, CsvReporter, JsonReporter, ReportColumn, ReportOrder, Reporter,
    SilentReporter,
};

/// Where the report goes at finalize.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// An aligned table on standard output.
    #[default]
    Console,
    /// `<output_dir>/<file_prefix>profile.csv`
    Csv,
    /// `<output_dir>/<file_prefix>profile.json`
    Json,
    /// No report.
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
    pub columns: Vec<ReportColumn>,
    pub order: ReportOrder,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            output_dir: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
            columns: ReportColumn::DEFAULT.to_vec(),
            order: ReportOrder::default(),
        }
    }
}

impl ReportOptions {
    /// The report file for extension `ext`: `<output_dir>/<file_prefix>profile.<ext>`.
    ///
    /// # Errors
    ///
    /// [`ProfilerError::OutputExists`] if the file exists and `overwrite` is not set.
    pub fn output_path(&self, ext: &str) -> Result<PathBuf, ProfilerError> {
        let path = self
            .output_dir
            .join(format!("{}profile.{ext}", self.file_prefix));
        if !self.overwrite && path.exists() {
            return Err(ProfilerError::OutputExists(path));
        }
        Ok(path)
    }

    /// Builds the reporter for the configured format.
    pub fn build_reporter(&self) -> Result<Box<dyn Reporter>, ProfilerError> {
        let columns = self.columns.clone();
        let reporter: Box<dyn Reporter> = match self.format {
            ReportFormat::Console => Box::new(ConsoleReporter::new(columns, self.order)),
            ReportFormat::Csv => Box::new(CsvReporter::new(
                self.output_path("csv")?,
                columns,
                self.order,
            )),
            ReportFormat::Json => Box::new(JsonReporter::new(
                self.output_path("json")?,
                columns,
                self.order,
            )),
            ReportFormat::Disabled => Box::new(SilentReporter::new(columns, self.order)),
        };
        Ok(reporter)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Stream a Chrome trace to this file.
    pub chrome_trace_file: Option<PathBuf>,
    /// Log every region transition to standard error.
    pub debug: bool,
    pub report: ReportOptions,
    #[serde(skip)]
    pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl ProfilerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfilerError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ProfilerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn chrome_trace_file<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.chrome_trace_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    pub fn report_format(&mut self, format: ReportFormat) -> &mut Self {
        self.report.format = format;
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut Self {
        self.report.output_dir = directory;
        self
    }

    pub fn file_prefix(&mut self, file_prefix: &str) -> &mut Self {
        self.report.file_prefix = file_prefix.to_string();
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.report.overwrite = overwrite;
        self
    }

    pub fn columns(&mut self, columns: &[ReportColumn]) -> &mut Self {
        self.report.columns = columns.to_vec();
        self
    }

    pub fn order(&mut self, order: ReportOrder) -> &mut Self {
        self.report.order = order;
        self
    }

    /// Times regions with `clock` instead of the monotonic wall clock.
    pub fn with_clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    pub fn clock(&self) -> Option<&Arc<dyn Clock>> {
        self.clock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::clock::TickClock;

    #[test]
    fn defaults() {
        let config = ProfilerConfig::default();
        assert_eq!(config.chrome_trace_file, None);
        assert!(!config.debug);
        assert_eq!(config.report.format, ReportFormat::Console);
        assert_eq!(config.report.columns, ReportColumn::DEFAULT.to_vec());
        assert!(config.clock().is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ProfilerConfig::from_json_str(
            r#"{"debug": true, "report": {"format": "none", "order": "total_time"}}"#,
        )
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.report.format, ReportFormat::Disabled);
        assert_eq!(config.report.order, ReportOrder::TotalTime);
        assert_eq!(config.report.output_dir, PathBuf::from("."));
    }

    #[test]
    fn loads_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("profiler.json");
        fs::write(
            &path,
            r#"{"chrome_trace_file": "trace.json", "report": {"format": "csv", "file_prefix": "run_", "columns": ["name", "count"]}}"#,
        )
        .unwrap();

        let config = ProfilerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.chrome_trace_file, Some(PathBuf::from("trace.json")));
        assert_eq!(config.report.format, ReportFormat::Csv);
        assert_eq!(config.report.file_prefix, "run_");
        assert_eq!(
            config.report.columns,
            vec![ReportColumn::Name, ReportColumn::Count]
        );
    }

    #[test]
    fn unknown_format_is_an_error() {
        let result = ProfilerConfig::from_json_str(r#"{"report": {"format": "xml"}}"#);
        assert!(matches!(result, Err(ProfilerError::JsonError(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ProfilerConfig::from_json_file("/nonexistent/profiler.json");
        assert!(matches!(result, Err(ProfilerError::IoError(_))));
    }

    #[test]
    fn setters_chain() {
        let mut config = ProfilerConfig::new();
        config
            .file_prefix("test_")
            .directory(PathBuf::from("out"))
            .overwrite(true)
            .report_format(ReportFormat::Json)
            .with_clock(Arc::new(TickClock::new()));
        assert_eq!(
            config.report.output_path("json").unwrap(),
            PathBuf::from("out").join("test_profile.json")
        );
        assert!(config.clock().is_some());
    }

    #[test]
    fn existing_output_is_refused_without_overwrite() {
        let temp_dir = tempdir().unwrap();
        let existing = temp_dir.path().join("prefix_profile.csv");
        fs::write(&existing, "PREEXISTING").unwrap();

        let mut config = ProfilerConfig::new();
        config
            .file_prefix("prefix_")
            .directory(temp_dir.path().to_path_buf())
            .report_format(ReportFormat::Csv);
        match config.report.build_reporter() {
            Err(ProfilerError::OutputExists(path)) => assert_eq!(path, existing),
            Err(error) => panic!("unexpected error: {error}"),
            Ok(_) => panic!("existing output was not refused"),
        }

        config.overwrite(true);
        assert!(config.report.build_reporter().is_ok());
    }
}
