pub mod config;
pub mod errors;
pub mod filters;
pub mod fs;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use errors::{SearchError, SearchResult};
pub use fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
pub use results::{
    CollectSink, CountingSink, MatchSink, NullSink, SearchReport, WorkerOutcome, WriterSink,
};
pub use search::{search, search_with_cancel, CancelHandle, StopReason};
