/// Error types for pfind.
///
/// Errors fall into two groups. Setup errors (bad thread count, empty or
/// missing root, invalid ignore pattern, thread spawn failure, config file
/// problems) abort the whole search before or while the pool starts. Scan
/// errors (a directory that cannot be listed, a queue reservation failure)
/// only retire the worker that hit them; the rest of the pool keeps going.
/// An [`SearchError::Output`] error also retires its worker, but stops the
/// others too, since nothing they find could be reported.
///
/// ```rust,ignore
/// match pfind::search(&config, LocalFileSystem, sink) {
///     Ok(report) => println!("{} matches", report.matches),
///     Err(SearchError::DirectoryNotFound(path)) => eprintln!("no such dir: {}", path.display()),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not a positive integer")]
    InvalidThreadCount(String),
    #[error("Root directory must not be empty")]
    EmptyRoot,
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Out of memory while queueing {0}")]
    QueueAllocation(PathBuf),
    #[error("Failed creating thread: {0}")]
    ThreadSpawn(#[source] io::Error),
    #[error("Failed writing output: {0}")]
    Output(#[source] io::Error),
    #[error("Worker pool state still in use after shutdown")]
    PoolShutdown,
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SearchError {
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_thread_count(value: impl Into<String>) -> Self {
        Self::InvalidThreadCount(value.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an `io::Error` raised while touching `path` onto the matching
    /// variant, so callers can tell a missing directory from a denied one.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::directory_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

impl From<::config::ConfigError> for SearchError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let path = Path::new("missing");
        let err = SearchError::directory_not_found(path);
        assert!(matches!(err, SearchError::DirectoryNotFound(_)));

        let err = SearchError::permission_denied(path);
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::invalid_thread_count("0");
        assert!(matches!(err, SearchError::InvalidThreadCount(_)));

        let err = SearchError::invalid_pattern("[");
        assert!(matches!(err, SearchError::InvalidPattern(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_thread_count("-3");
        assert_eq!(err.to_string(), "-3 is not a positive integer");

        let err = SearchError::directory_not_found("nope/");
        assert_eq!(err.to_string(), "Directory does not exist: nope/");

        let err = SearchError::config_error("Missing required field");
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );
    }

    #[test]
    fn test_from_io_classification() {
        let path = Path::new("some/dir");

        let err = SearchError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, SearchError::DirectoryNotFound(_)));

        let err = SearchError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::from_io(path, io::Error::new(io::ErrorKind::Other, "flaky"));
        assert!(matches!(err, SearchError::Io { path: ref p, .. } if p == path));
    }

    #[test]
    fn test_output_error_keeps_kind() {
        let err = SearchError::Output(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.to_string().starts_with("Failed writing output:"));
        assert!(matches!(err, SearchError::Output(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
