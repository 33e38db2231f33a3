use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Tracks traversal progress across all workers
#[derive(Debug, Clone)]
pub struct TraversalMetrics {
    dirs_scanned: Arc<AtomicU64>,
    entries_seen: Arc<AtomicU64>,
    dirs_enqueued: Arc<AtomicU64>,
    dir_failures: Arc<AtomicU64>,
    ignored: Arc<AtomicU64>,
    peak_queue: Arc<AtomicU64>,
}

impl TraversalMetrics {
    /// Creates a new TraversalMetrics instance
    pub fn new() -> Self {
        Self {
            dirs_scanned: Arc::new(AtomicU64::new(0)),
            entries_seen: Arc::new(AtomicU64::new(0)),
            dirs_enqueued: Arc::new(AtomicU64::new(0)),
            dir_failures: Arc::new(AtomicU64::new(0)),
            ignored: Arc::new(AtomicU64::new(0)),
            peak_queue: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a directory whose listing succeeded
    pub fn record_dir_scanned(&self, entries: u64) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
        self.entries_seen.fetch_add(entries, Ordering::Relaxed);
    }

    /// Records a subdirectory pushed onto the queue, with the queue length
    /// right after the push
    pub fn record_enqueue(&self, queue_len: usize) {
        self.dirs_enqueued.fetch_add(1, Ordering::Relaxed);
        let len = queue_len as u64;
        let mut peak = self.peak_queue.load(Ordering::Relaxed);
        while len > peak {
            match self.peak_queue.compare_exchange_weak(
                peak,
                len,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => peak = current,
            }
        }
    }

    pub fn record_dir_failure(&self) {
        let total = self.dir_failures.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Directory failures so far: {}", total);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> TraversalStats {
        TraversalStats {
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            entries_seen: self.entries_seen.load(Ordering::Relaxed),
            dirs_enqueued: self.dirs_enqueued.load(Ordering::Relaxed),
            dir_failures: self.dir_failures.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            peak_queue: self.peak_queue.load(Ordering::Relaxed),
        }
    }

    /// Logs the counters together with how long the search took
    pub fn log_stats(&self, elapsed: Duration) {
        let stats = self.get_stats();
        // Millisecond precision is plenty for a summary line.
        let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
        info!(
            "Traversal stats:\n\
             Elapsed: {}\n\
             Directories scanned/failed: {}/{}\n\
             Directories enqueued: {}\n\
             Entries seen: {}\n\
             Entries ignored: {}\n\
             Peak queue length: {}",
            humantime::format_duration(elapsed),
            stats.dirs_scanned,
            stats.dir_failures,
            stats.dirs_enqueued,
            stats.entries_seen,
            stats.ignored,
            stats.peak_queue
        );
    }
}

impl Default for TraversalMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the traversal counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    pub dirs_scanned: u64,
    pub entries_seen: u64,
    pub dirs_enqueued: u64,
    pub dir_failures: u64,
    pub ignored: u64,
    pub peak_queue: u64,
}
