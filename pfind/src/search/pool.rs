use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;

use tracing::{debug, error, info, warn};

use super::cancel::{CancelHandle, Waker};
use super::queue::{PathEntry, WorkQueue};
use super::scanner::{DirectoryScanner, ScannedEntry};
use super::termination::TerminationDetector;
use crate::errors::{SearchError, SearchResult};
use crate::fs::FileSystem;
use crate::results::{MatchSink, SearchReport, WorkerOutcome};

/// Everything guarded by the pool's single lock.
struct PoolState<S> {
    queue: WorkQueue,
    detector: TerminationDetector,
    matches: u64,
    sink: S,
}

struct Shared<S> {
    state: Mutex<PoolState<S>>,
    work_available: Condvar,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, PoolState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes a worker that will never take work again and lets one waiter
    /// re-evaluate termination.
    fn retire(&self) {
        self.lock().detector.retire();
        self.work_available.notify_one();
    }
}

impl<S: Send> Waker for Shared<S> {
    fn wake_all(&self) {
        let _state = self.lock();
        self.work_available.notify_all();
    }
}

/// Retires the worker if its thread unwinds, so the others are not left
/// waiting for it forever.
struct RetireOnPanic<'a, S>(&'a Shared<S>);

impl<S> Drop for RetireOnPanic<'_, S> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.retire();
        }
    }
}

struct Worker<'a, F: ?Sized, S> {
    id: usize,
    shared: &'a Shared<S>,
    scanner: &'a DirectoryScanner<'a, F>,
    cancel: &'a CancelHandle,
}

impl<F: FileSystem + ?Sized, S: MatchSink> Worker<'_, F, S> {
    fn run(self) -> WorkerOutcome {
        let _guard = RetireOnPanic(self.shared);
        loop {
            let dir = match self.next_directory() {
                ControlFlow::Continue(dir) => dir,
                ControlFlow::Break(outcome) => return outcome,
            };

            if let Err(e) = self.scan(&dir) {
                if let SearchError::Output(_) = e {
                    // Stop the others before retiring, so none can declare completion.
                    warn!(worker = self.id, "Stopping search: {}", e);
                    self.cancel.abort();
                } else {
                    warn!(worker = self.id, "{}", e);
                    self.scanner.metrics().record_dir_failure();
                }
                self.shared.retire();
                return WorkerOutcome::Failed(e);
            }
        }
    }

    /// Blocks until there is a directory to scan or the worker should stop.
    fn next_directory(&self) -> ControlFlow<WorkerOutcome, PathEntry> {
        let mut state = self.shared.lock();
        loop {
            if self.cancel.is_cancelled() {
                debug!(worker = self.id, "Stopping on request");
                return ControlFlow::Break(WorkerOutcome::Cancelled);
            }
            if let Some(dir) = state.queue.dequeue() {
                return ControlFlow::Continue(dir);
            }
            if state.detector.enter_wait() {
                // Waking the others takes the lock, so release it first.
                drop(state);
                debug!(worker = self.id, "All workers idle, search complete");
                self.cancel.complete();
                return ControlFlow::Break(WorkerOutcome::Completed);
            }
            state = self
                .shared
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.detector.leave_wait();
        }
    }

    fn scan(&self, dir: &PathEntry) -> SearchResult<()> {
        let names = self.scanner.list(dir)?;
        for name in &names {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            match self.scanner.inspect(dir, name) {
                Some(ScannedEntry::Subdirectory(child)) => self.enqueue(child)?,
                Some(ScannedEntry::Match(path)) => self.report(&path)?,
                None => {}
            }
        }
        Ok(())
    }

    fn enqueue(&self, child: PathEntry) -> SearchResult<()> {
        let mut state = self.shared.lock();
        state
            .queue
            .enqueue(child)
            .map_err(|e| SearchError::QueueAllocation(e.entry.into_path()))?;
        self.scanner.metrics().record_enqueue(state.queue.len());
        drop(state);
        self.shared.work_available.notify_one();
        Ok(())
    }

    /// Counts a match only once the sink has accepted it.
    fn report(&self, path: &Path) -> SearchResult<()> {
        let mut state = self.shared.lock();
        state.sink.report(path).map_err(SearchError::Output)?;
        state.matches += 1;
        Ok(())
    }
}

/// A fixed number of threads draining one shared queue of directories.
pub struct WorkerPool {
    threads: NonZeroUsize,
    cancel: CancelHandle,
}

impl WorkerPool {
    pub fn new(threads: NonZeroUsize, cancel: CancelHandle) -> Self {
        Self { threads, cancel }
    }

    /// Seeds the queue with `root`, runs every worker to the end and joins
    /// them. Fails only if the seed cannot be queued or a thread cannot be
    /// spawned; in the latter case the workers already running are stopped
    /// and joined first.
    ///
    /// A sink that refuses a path stops the whole pool with
    /// [`StopReason::Aborted`](super::StopReason::Aborted); the error comes
    /// back as that worker's [`WorkerOutcome::Failed`].
    pub fn run<F, S>(
        &self,
        scanner: &DirectoryScanner<'_, F>,
        root: PathEntry,
        sink: S,
    ) -> SearchResult<SearchReport<S>>
    where
        F: FileSystem + ?Sized,
        S: MatchSink + 'static,
    {
        let threads = self.threads.get();

        let mut queue = WorkQueue::new();
        queue
            .enqueue(root)
            .map_err(|e| SearchError::QueueAllocation(e.entry.into_path()))?;

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue,
                detector: TerminationDetector::new(threads),
                matches: 0,
                sink,
            }),
            work_available: Condvar::new(),
        });
        let weak = Arc::downgrade(&shared);
        let waker: Weak<dyn Waker> = weak;
        self.cancel.register(waker.clone());

        info!("Starting {} workers", threads);
        let joined = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(threads);
            for id in 0..threads {
                let worker = Worker {
                    id,
                    shared: &shared,
                    scanner,
                    cancel: &self.cancel,
                };
                let spawned = thread::Builder::new()
                    .name(format!("pfind-worker-{}", id))
                    .spawn_scoped(scope, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        error!("Failed creating thread {}: {}", id, e);
                        self.cancel.abort();
                        for handle in handles {
                            let _ = handle.join();
                        }
                        return Err(SearchError::ThreadSpawn(e));
                    }
                }
            }

            Ok(handles
                .into_iter()
                .enumerate()
                .map(|(id, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        error!(worker = id, "Worker panicked");
                        WorkerOutcome::Panicked
                    })
                })
                .collect::<Vec<_>>())
        });
        self.cancel.unregister(&waker);
        let outcomes = joined?;

        let shared = Arc::into_inner(shared).ok_or(SearchError::PoolShutdown)?;
        let mut state = shared
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let pending = state.queue.clear();
        if pending > 0 {
            debug!("Dropped {} queued directories", pending);
        }

        Ok(SearchReport {
            matches: state.matches,
            outcomes,
            stop_reason: self.cancel.reason(),
            pending,
            sink: state.sink,
        })
    }
}
