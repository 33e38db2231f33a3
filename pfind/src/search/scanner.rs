use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use tracing::{debug, trace};

use super::queue::PathEntry;
use crate::errors::SearchResult;
use crate::filters::IgnoreFilter;
use crate::fs::{EntryKind, FileSystem};
use crate::metrics::TraversalMetrics;

/// What one directory entry turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedEntry {
    /// A subdirectory to be queued.
    Subdirectory(PathEntry),
    /// A file whose name contains the search term.
    Match(PathBuf),
}

/// Turns a directory into subdirectories and matches.
///
/// Holds no per-directory state, so a single scanner is shared by every
/// worker. Listing and classification go through the [`FileSystem`]; the
/// scanner itself never touches the disk.
pub struct DirectoryScanner<'a, F: ?Sized> {
    fs: &'a F,
    filter: &'a IgnoreFilter,
    term: &'a str,
    metrics: &'a TraversalMetrics,
}

impl<'a, F: FileSystem + ?Sized> DirectoryScanner<'a, F> {
    pub fn new(
        fs: &'a F,
        filter: &'a IgnoreFilter,
        term: &'a str,
        metrics: &'a TraversalMetrics,
    ) -> Self {
        Self {
            fs,
            filter,
            term,
            metrics,
        }
    }

    pub fn metrics(&self) -> &TraversalMetrics {
        self.metrics
    }

    /// Lists the names inside `dir`.
    pub fn list(&self, dir: &PathEntry) -> SearchResult<Vec<OsString>> {
        let names = self.fs.list_entries(dir.as_path())?;
        debug!("Scanning {} ({} entries)", dir, names.len());
        self.metrics.record_dir_scanned(names.len() as u64);
        Ok(names)
    }

    /// Classifies the entry `name` inside `dir`.
    ///
    /// Returns `None` for `.` and `..`, for ignored entries and for files
    /// that do not match. An entry that cannot be classified is treated as a
    /// regular file, so its name can still match.
    pub fn inspect(&self, dir: &PathEntry, name: &OsStr) -> Option<ScannedEntry> {
        if name == "." || name == ".." {
            return None;
        }

        let path = dir.child(name);
        if self.filter.should_ignore(&path) {
            trace!("Ignoring {}", path.display());
            self.metrics.record_ignored();
            return None;
        }

        let kind = self.fs.classify(&path).unwrap_or_else(|e| {
            trace!("Could not classify {}: {}", path.display(), e);
            EntryKind::Regular
        });

        match kind {
            EntryKind::Directory => Some(ScannedEntry::Subdirectory(PathEntry::new(path))),
            EntryKind::Regular if name_matches(name, self.term) => Some(ScannedEntry::Match(path)),
            EntryKind::Regular => None,
        }
    }
}

/// Case-sensitive substring match on an entry name. Names that are not valid
/// UTF-8 are compared lossily.
pub fn name_matches(name: &OsStr, term: &str) -> bool {
    name.to_string_lossy().contains(term)
}
