/// Output side of a search: where matched paths go, and what the pool hands
/// back once every worker has been joined.
///
/// A [`MatchSink`] lives inside the pool's shared state and is only ever
/// called with the shared lock held, together with the match counter update.
/// Two workers can therefore never interleave their lines, and the counter
/// always equals the number of paths the sink accepted.
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::SearchError;
use crate::search::StopReason;

/// Receives matched paths, one call per match.
pub trait MatchSink: Send {
    fn report(&mut self, path: &Path) -> io::Result<()>;
}

impl<T: MatchSink + ?Sized> MatchSink for Box<T> {
    fn report(&mut self, path: &Path) -> io::Result<()> {
        (**self).report(path)
    }
}

/// Writes one line per match to any writer (usually stdout).
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> MatchSink for WriterSink<W> {
    fn report(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.writer, "{}", path.display())?;
        self.writer.flush()
    }
}

/// Keeps matched paths in memory, in the order they were reported.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub paths: Vec<PathBuf>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchSink for CollectSink {
    fn report(&mut self, path: &Path) -> io::Result<()> {
        self.paths.push(path.to_path_buf());
        Ok(())
    }
}

/// Counts matches without recording them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MatchSink for NullSink {
    fn report(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Forwards to another sink and counts the paths it accepted.
///
/// The count lives behind an `Arc`, so it can be read while the search is
/// still running, for instance from a signal handler that cannot wait for
/// the pool to be joined.
#[derive(Debug)]
pub struct CountingSink<S> {
    inner: S,
    count: Arc<AtomicU64>,
}

impl<S: MatchSink> CountingSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A handle on the running count.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.count)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MatchSink> MatchSink for CountingSink<S> {
    fn report(&mut self, path: &Path) -> io::Result<()> {
        self.inner.report(path)?;
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// How a single worker thread ended.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The worker observed that every worker was idle and declared the search done.
    Completed,
    /// The worker stopped because a stop was requested.
    Cancelled,
    /// The worker hit a local error and retired.
    Failed(SearchError),
    /// The worker thread panicked.
    Panicked,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Completed)
    }
}

/// Everything the pool knows once all workers have been joined.
#[derive(Debug)]
pub struct SearchReport<S> {
    /// Total number of matches reported to the sink.
    pub matches: u64,
    /// One entry per worker, indexed by worker id.
    pub outcomes: Vec<WorkerOutcome>,
    /// Why the pool stopped, if a stop was requested.
    pub stop_reason: Option<StopReason>,
    /// Directories still queued when the pool stopped.
    pub pending: usize,
    /// The sink, handed back to the caller.
    pub sink: S,
}

impl<S> SearchReport<S> {
    pub fn interrupted(&self) -> bool {
        self.stop_reason == Some(StopReason::Interrupted)
    }

    /// A search succeeds if at least one worker completed, or if it was
    /// interrupted by the operator. It fails only when every worker failed.
    pub fn succeeded(&self) -> bool {
        self.interrupted() || self.outcomes.iter().any(WorkerOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SearchError> {
        self.outcomes.iter().filter_map(|o| match o {
            WorkerOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }

    /// The write error that stopped the search, if the sink refused a path.
    pub fn output_error(&self) -> Option<&io::Error> {
        self.failures().find_map(|e| match e {
            SearchError::Output(err) => Some(err),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(
        outcomes: Vec<WorkerOutcome>,
        stop_reason: Option<StopReason>,
    ) -> SearchReport<NullSink> {
        SearchReport {
            matches: 0,
            outcomes,
            stop_reason,
            pending: 0,
            sink: NullSink,
        }
    }

    #[test]
    fn test_writer_sink_lines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.report(Path::new("root/a.txt")).unwrap();
        sink.report(Path::new("root/b/a.txt")).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "root/a.txt\nroot/b/a.txt\n");
    }

    #[test]
    fn test_collect_sink_keeps_order() {
        let mut sink = CollectSink::new();
        sink.report(Path::new("x")).unwrap();
        sink.report(Path::new("y")).unwrap();
        assert_eq!(sink.paths, vec![PathBuf::from("x"), PathBuf::from("y")]);
    }

    #[test]
    fn test_success_requires_one_completed_worker() {
        let all_failed = report(
            vec![
                WorkerOutcome::Failed(SearchError::directory_not_found("r/")),
                WorkerOutcome::Panicked,
            ],
            None,
        );
        assert!(!all_failed.succeeded());
        assert_eq!(all_failed.failures().count(), 1);

        let one_done = report(
            vec![
                WorkerOutcome::Failed(SearchError::permission_denied("r/x")),
                WorkerOutcome::Completed,
                WorkerOutcome::Cancelled,
            ],
            Some(StopReason::Completed),
        );
        assert!(one_done.succeeded());
    }

    #[test]
    fn test_interrupt_counts_as_success() {
        let stopped = report(
            vec![WorkerOutcome::Cancelled, WorkerOutcome::Cancelled],
            Some(StopReason::Interrupted),
        );
        assert!(stopped.interrupted());
        assert!(stopped.succeeded());
    }

    #[test]
    fn test_counting_sink_counts_accepted_paths() {
        let mut sink = CountingSink::new(WriterSink::new(Vec::new()));
        let counter = sink.counter();
        sink.report(Path::new("a")).unwrap();
        sink.report(Path::new("b")).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(sink.into_inner().into_inner(), b"a\nb\n");
    }

    #[test]
    fn test_counting_sink_skips_refused_paths() {
        struct Closed;
        impl MatchSink for Closed {
            fn report(&mut self, _path: &Path) -> io::Result<()> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
        }

        let mut sink = CountingSink::new(Closed);
        assert!(sink.report(Path::new("a")).is_err());
        assert_eq!(sink.counter().load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_output_error_found_among_failures() {
        let stopped = report(
            vec![
                WorkerOutcome::Cancelled,
                WorkerOutcome::Failed(SearchError::Output(io::Error::from(
                    io::ErrorKind::BrokenPipe,
                ))),
            ],
            Some(StopReason::Aborted),
        );
        assert_eq!(
            stopped.output_error().map(io::Error::kind),
            Some(io::ErrorKind::BrokenPipe)
        );
        assert!(!stopped.succeeded());
        assert!(report(vec![WorkerOutcome::Completed], None).output_error().is_none());
    }
}
