use std::collections::TryReserveError;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A directory waiting to be scanned.
///
/// Owned by exactly one party at a time: whoever discovered it, then the
/// queue, then the worker that dequeued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    path: PathBuf,
}

impl PathEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Full path of the child named `name` inside this directory.
    pub fn child(&self, name: &OsStr) -> PathBuf {
        self.path.join(name)
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Returned when the queue cannot grow. The entry is handed back.
#[derive(Error, Debug)]
#[error("failed to reserve queue space for {entry}")]
pub struct EnqueueError {
    pub entry: PathEntry,
    #[source]
    source: TryReserveError,
}

/// FIFO of pending directories.
///
/// No locking of its own. The pool keeps it inside the shared state mutex.
#[derive(Debug, Default)]
pub struct WorkQueue {
    entries: VecDeque<PathEntry>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail.
    pub fn enqueue(&mut self, entry: PathEntry) -> Result<(), EnqueueError> {
        if let Err(source) = self.entries.try_reserve(1) {
            return Err(EnqueueError { entry, source });
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Removes the head, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<PathEntry> {
        self.entries.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Next entry to be dequeued.
    pub fn front(&self) -> Option<&PathEntry> {
        self.entries.front()
    }

    /// Most recently enqueued entry.
    pub fn back(&self) -> Option<&PathEntry> {
        self.entries.back()
    }

    /// Drops every pending entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let pending = self.entries.len();
        self.entries.clear();
        pending
    }
}
