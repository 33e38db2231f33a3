/// Entry filtering by glob pattern.
///
/// Patterns are compiled once, when the search is set up, so an invalid
/// pattern is reported before any worker starts. An entry is ignored when a
/// pattern matches either its full path or its bare name. An ignored
/// directory is neither matched nor descended into.
use glob::Pattern;
use std::path::Path;

use crate::errors::{SearchError, SearchResult};

/// Compiled ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Compiles `patterns`, failing on the first invalid one.
    pub fn new(patterns: &[String]) -> SearchResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| SearchError::invalid_pattern(format!("{}: {}", p, e)))
            })
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Checks if an entry should be skipped.
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let normalized_path = path.to_string_lossy().replace('\\', "/");
        let name = path.file_name().map(|n| n.to_string_lossy());

        self.patterns.iter().any(|p| {
            p.matches(&normalized_path) || name.as_deref().is_some_and(|n| p.matches(n))
        })
    }
}
