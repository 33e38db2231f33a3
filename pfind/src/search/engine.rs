use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::cancel::CancelHandle;
use super::pool::WorkerPool;
use super::queue::PathEntry;
use super::scanner::DirectoryScanner;
use crate::config::{normalize_root, SearchConfig};
use crate::errors::{SearchError, SearchResult};
use crate::filters::IgnoreFilter;
use crate::fs::FileSystem;
use crate::metrics::TraversalMetrics;
use crate::results::{MatchSink, SearchReport};

/// Searches `config.root_path` for files whose name contains
/// `config.search_term`, reporting each match to `sink`.
pub fn search<F, S>(config: &SearchConfig, fs: F, sink: S) -> SearchResult<SearchReport<S>>
where
    F: FileSystem,
    S: MatchSink + 'static,
{
    search_with_cancel(config, fs, sink, CancelHandle::new())
}

/// Like [`search`], but stops early once `cancel` is triggered. The handle
/// can be cloned beforehand and interrupted from another thread.
pub fn search_with_cancel<F, S>(
    config: &SearchConfig,
    fs: F,
    sink: S,
    cancel: CancelHandle,
) -> SearchResult<SearchReport<S>>
where
    F: FileSystem,
    S: MatchSink + 'static,
{
    let root = normalize_root(&config.root_path)?;
    info!(
        "Starting search for {:?} under {} with {} threads",
        config.search_term, root, config.thread_count
    );

    if !fs.is_dir(Path::new(&root)) {
        return Err(SearchError::directory_not_found(root));
    }

    let filter = IgnoreFilter::new(&config.ignore_patterns)?;
    if !filter.is_empty() {
        debug!("Ignore patterns: {:?}", config.ignore_patterns);
    }

    let metrics = TraversalMetrics::new();
    let scanner = DirectoryScanner::new(&fs, &filter, &config.search_term, &metrics);
    let start = Instant::now();

    let report =
        WorkerPool::new(config.thread_count, cancel).run(&scanner, PathEntry::new(root), sink)?;

    metrics.log_stats(start.elapsed());
    info!(
        "Search finished ({:?}). Found {} matches, {} of {} workers failed",
        report.stop_reason,
        report.matches,
        report.failures().count(),
        report.outcomes.len()
    );

    Ok(report)
}
