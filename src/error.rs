use std::fmt::{self, Debug, Display};
use std::io;
use std::path::PathBuf;

/// Provides `ProfilerError` and maps to other errors to
/// convert to a `ProfilerError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ProfilerError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// `Timer::start` was called on a timer with an open interval.
    TimerAlreadyRunning,
    /// `Timer::stop` or `Timer::cancel` was called without an open interval.
    TimerNotRunning,
    /// The profiler has already been finalized.
    AlreadyFinalized,
    /// An output file exists and the report options do not allow overwriting it.
    OutputExists(PathBuf),
    ProfilerError(String),
}

impl From<io::Error> for ProfilerError {
    fn from(error: io::Error) -> Self {
        ProfilerError::IoError(error)
    }
}

impl From<serde_json::Error> for ProfilerError {
    fn from(error: serde_json::Error) -> Self {
        ProfilerError::JsonError(error)
    }
}

impl From<csv::Error> for ProfilerError {
    fn from(error: csv::Error) -> Self {
        ProfilerError::CsvError(error)
    }
}

impl From<String> for ProfilerError {
    fn from(error: String) -> Self {
        ProfilerError::ProfilerError(error)
    }
}

impl From<&str> for ProfilerError {
    fn from(error: &str) -> Self {
        ProfilerError::ProfilerError(error.to_string())
    }
}

impl std::error::Error for ProfilerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfilerError::IoError(error) => Some(error),
            ProfilerError::JsonError(error) => Some(error),
            ProfilerError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ProfilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProfilerError::IoError(error) => write!(f, "I/O error: {error}"),
            ProfilerError::JsonError(error) => write!(f, "JSON error: {error}"),
            ProfilerError::CsvError(error) => write!(f, "CSV error: {error}"),
            ProfilerError::TimerAlreadyRunning => write!(f, "timer is already running"),
            ProfilerError::TimerNotRunning => write!(f, "timer is not running"),
            ProfilerError::AlreadyFinalized => write!(f, "profiler has already been finalized"),
            ProfilerError::OutputExists(path) => {
                write!(f, "output file already exists: {}", path.display())
            }
            ProfilerError::ProfilerError(message) => write!(f, "Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProfilerError;
    use std::error::Error;
    use std::path::PathBuf;

    #[test]
    fn io_errors_convert_and_keep_their_source() {
        let error: ProfilerError = std::io::Error::other("disk full").into();
        assert!(matches!(error, ProfilerError::IoError(_)));
        assert!(error.source().is_some());
        assert_eq!(error.to_string(), "I/O error: disk full");
    }

    #[test]
    fn string_errors_convert() {
        let error: ProfilerError = "bad column".into();
        assert_eq!(error.to_string(), "Error: bad column");
        assert!(error.source().is_none());
    }

    #[test]
    fn output_exists_names_the_path() {
        let error = ProfilerError::OutputExists(PathBuf::from("out/profile.csv"));
        assert_eq!(
            error.to_string(),
            "output file already exists: out/profile.csv"
        );
    }
}
