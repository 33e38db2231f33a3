//! Filesystem collaborator used by the traversal engine.
//!
//! The engine never touches `std::fs` directly. It asks a [`FileSystem`] three
//! questions: is this path a directory, what kind of entry is this child, and
//! what names does this directory contain. [`LocalFileSystem`] answers them
//! from the real disk; [`MemoryFileSystem`] answers them from an in-memory
//! tree, which makes unreadable directories and other failure modes easy to
//! reproduce.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{SearchError, SearchResult};

/// What a directory entry turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory; it becomes a new work item.
    Directory,
    /// Anything else; it is a match candidate.
    Regular,
}

/// A source of directory listings and path classification.
///
/// `Send + Sync` are required since a single instance is shared by every
/// worker in the pool.
pub trait FileSystem: Send + Sync {
    /// Returns `true` if `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Classifies a single path.
    fn classify(&self, path: &Path) -> SearchResult<EntryKind>;

    /// Lists the names inside directory `path`.
    ///
    /// Implementations may include the `.` and `..` pseudo-entries; the
    /// scanner skips them.
    fn list_entries(&self, path: &Path) -> SearchResult<Vec<OsString>>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn classify(&self, path: &Path) -> SearchResult<EntryKind> {
        (**self).classify(path)
    }

    fn list_entries(&self, path: &Path) -> SearchResult<Vec<OsString>> {
        (**self).list_entries(path)
    }
}

/// The real filesystem, backed by `std::fs`.
///
/// Classification follows symbolic links, so a link to a directory is
/// traversed like the directory itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    fn classify(&self, path: &Path) -> SearchResult<EntryKind> {
        let metadata = fs::metadata(path).map_err(|e| SearchError::from_io(path, e))?;
        if metadata.is_dir() {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::Regular)
        }
    }

    fn list_entries(&self, path: &Path) -> SearchResult<Vec<OsString>> {
        let reader = fs::read_dir(path).map_err(|e| SearchError::from_io(path, e))?;

        let mut names = Vec::new();
        for entry in reader {
            match entry {
                Ok(entry) => names.push(entry.file_name()),
                Err(e) => warn!("Skipping unreadable entry in {}: {}", path.display(), e),
            }
        }
        Ok(names)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir {
        readable: bool,
        children: BTreeSet<OsString>,
    },
    File,
}

/// An in-memory directory tree.
///
/// Listings always start with `.` and `..`, the way `readdir` reports them.
///
/// ```rust
/// use pfind::fs::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new()
///     .with_file("root/a.txt")
///     .with_unreadable_dir("root/locked");
///
/// assert!(fs.is_dir(Path::new("root/")));
/// assert!(fs.list_entries(Path::new("root/locked")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, Node>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a regular file, creating any missing parent directories.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.link_to_parent(path);
        self.nodes.insert(path.to_path_buf(), Node::File);
        self
    }

    /// Adds an empty, readable directory and its parents.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref(), true);
        self
    }

    /// Adds a directory whose listing fails with permission denied.
    pub fn with_unreadable_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref(), false);
        self
    }

    fn insert_dir(&mut self, path: &Path, readable: bool) {
        self.link_to_parent(path);
        match self.nodes.get_mut(path) {
            Some(Node::Dir { readable: r, .. }) => *r = readable,
            _ => {
                self.nodes.insert(
                    path.to_path_buf(),
                    Node::Dir {
                        readable,
                        children: BTreeSet::new(),
                    },
                );
            }
        }
    }

    fn link_to_parent(&mut self, path: &Path) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        if parent.as_os_str().is_empty() {
            return;
        }
        if !matches!(self.nodes.get(parent), Some(Node::Dir { .. })) {
            self.insert_dir(parent, true);
        }
        if let Some(Node::Dir { children, .. }) = self.nodes.get_mut(parent) {
            children.insert(name.to_os_string());
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.get(path), Some(Node::Dir { .. }))
    }

    fn classify(&self, path: &Path) -> SearchResult<EntryKind> {
        match self.nodes.get(path) {
            Some(Node::Dir { .. }) => Ok(EntryKind::Directory),
            Some(Node::File) => Ok(EntryKind::Regular),
            None => Err(SearchError::directory_not_found(path)),
        }
    }

    fn list_entries(&self, path: &Path) -> SearchResult<Vec<OsString>> {
        match self.nodes.get(path) {
            Some(Node::Dir {
                readable: true,
                children,
            }) => {
                let mut names = vec![OsString::from("."), OsString::from("..")];
                names.extend(children.iter().cloned());
                Ok(names)
            }
            Some(Node::Dir { readable: false, .. }) => Err(SearchError::permission_denied(path)),
            Some(Node::File) => Err(SearchError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            }),
            None => Err(SearchError::directory_not_found(path)),
        }
    }
}
