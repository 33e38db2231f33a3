/// Parallel directory traversal.
///
/// A fixed pool of worker threads shares one FIFO of pending directories.
/// Each worker takes a directory, lists it, queues the subdirectories it
/// finds and reports the files whose name contains the search term. There is
/// no coordinator: a worker that finds the queue empty goes idle, and the
/// worker that makes *every* live worker idle at once knows nothing else can
/// ever be produced, so it declares the search complete and wakes the rest.
///
/// ```text
///            +-------------------- WorkQueue (FIFO) <-------------------+
///            |                                                          |
///   seed --> +--> worker 0 --scan--> subdirectories --enqueue-----------+
///            +--> worker 1 --scan--> matches --> MatchSink (under lock)
///            +--> worker N-1
/// ```
///
/// Stopping is cooperative. A [`CancelHandle`] carries the first stop
/// reason (completion, interrupt, startup failure) and wakes idle workers;
/// busy workers notice it before their next directory entry.
///
/// The queue, the idle count, the match counter and the sink all live behind
/// one mutex. The lock is never held across a filesystem call.
mod cancel;
mod engine;
mod pool;
mod queue;
mod scanner;
mod termination;

pub use cancel::{CancelHandle, StopReason};
pub use engine::{search, search_with_cancel};
pub use pool::WorkerPool;
pub use queue::{EnqueueError, PathEntry, WorkQueue};
pub use scanner::{name_matches, DirectoryScanner, ScannedEntry};
pub use termination::TerminationDetector;
