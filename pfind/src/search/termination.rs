/// Idle bookkeeping for the worker pool.
///
/// Lives inside the pool's locked state, so every call happens with the lock
/// held. A worker that finds the queue empty calls [`enter_wait`]; if it was
/// the last active worker, nobody can produce more work and the search is
/// over. Otherwise it sleeps and calls [`leave_wait`] after every wake.
///
/// A worker that fails for good is [`retire`]d: it leaves the pool instead of
/// counting as idle, so the remaining workers can still reach agreement.
///
/// [`enter_wait`]: TerminationDetector::enter_wait
/// [`leave_wait`]: TerminationDetector::leave_wait
/// [`retire`]: TerminationDetector::retire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationDetector {
    waiting: usize,
    total_workers: usize,
}

impl TerminationDetector {
    pub fn new(total_workers: usize) -> Self {
        Self {
            waiting: 0,
            total_workers,
        }
    }

    /// Marks the caller idle. Returns `true` when every live worker is now
    /// idle, which means the traversal is complete.
    pub fn enter_wait(&mut self) -> bool {
        self.waiting += 1;
        debug_assert!(self.waiting <= self.total_workers);
        self.waiting == self.total_workers
    }

    /// Marks the caller active again after a wake.
    pub fn leave_wait(&mut self) {
        self.waiting = self.waiting.saturating_sub(1);
    }

    /// Removes an active (not waiting) worker from the pool.
    pub fn retire(&mut self) {
        self.total_workers = self.total_workers.saturating_sub(1);
        debug_assert!(self.waiting <= self.total_workers);
    }

    pub fn waiting(&self) -> usize {
        self.waiting
    }

    pub fn total_workers(&self) -> usize {
        self.total_workers
    }
}
