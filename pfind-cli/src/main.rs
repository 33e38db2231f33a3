use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use pfind::{
    config::parse_thread_count, search_with_cancel, CancelHandle, CountingSink, LocalFileSystem,
    MatchSink, NullSink, SearchConfig, SearchReport, WriterSink,
};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::{self, ExitCode},
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Search a directory tree in parallel for files whose name contains a string
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to start from
    root: String,

    /// Substring to look for in file names (case-sensitive)
    #[arg(allow_hyphen_values = true)]
    term: String,

    /// Number of worker threads (positive integer)
    #[arg(allow_hyphen_values = true)]
    threads: String,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Print only the final count, not the matched paths
    #[arg(short, long)]
    stats: bool,

    /// Path to a config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(long)]
    log_level: Option<String>,
}

/// What Ctrl-C does. The first press asks the workers to stop at their next
/// checkpoint. Any later press gives up on them, since a worker blocked in a
/// listing never reaches a checkpoint.
struct InterruptHandler {
    cancel: CancelHandle,
    presses: AtomicUsize,
    found: Arc<AtomicU64>,
}

impl InterruptHandler {
    fn new(cancel: CancelHandle, found: Arc<AtomicU64>) -> Self {
        Self {
            cancel,
            presses: AtomicUsize::new(0),
            found,
        }
    }

    /// Returns the match count to print when the process must exit now.
    fn on_interrupt(&self) -> Option<u64> {
        if self.presses.fetch_add(1, Ordering::SeqCst) == 0 {
            self.cancel.interrupt();
            None
        } else {
            Some(self.found.load(Ordering::SeqCst))
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Rejected before anything else is set up.
    let thread_count = parse_thread_count(&cli.threads)?;

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let config = file_config.merge_with_cli(SearchConfig {
        root_path: cli.root,
        search_term: cli.term,
        thread_count,
        ignore_patterns: cli.ignore,
        stats_only: cli.stats,
        log_level: cli.log_level.unwrap_or_default(),
    });

    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let sink: Box<dyn MatchSink> = if config.stats_only {
        Box::new(NullSink)
    } else {
        Box::new(WriterSink::stdout())
    };
    let sink = CountingSink::new(sink);

    let cancel = CancelHandle::new();
    let interrupts = InterruptHandler::new(cancel.clone(), sink.counter());
    ctrlc::set_handler(move || match interrupts.on_interrupt() {
        None => {
            eprintln!("\nInterrupt received, stopping. Press Ctrl-C again to exit immediately.")
        }
        Some(found) => {
            let _ = writeln!(io::stdout().lock(), "Search stopped, found {} files", found);
            process::exit(0);
        }
    })
    .context("Failed to set signal handler")?;

    let report = search_with_cancel(&config, LocalFileSystem, sink, cancel)?;

    // A closed stdout (`pfind ... | head`) ends the run quietly.
    if let Some(e) = report.output_error() {
        if e.kind() == io::ErrorKind::BrokenPipe {
            debug!("Output closed after {} matches", report.matches);
            return Ok(ExitCode::SUCCESS);
        }
        return Err(anyhow!("Failed writing output: {}", e));
    }
    match print_summary(&report) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(ExitCode::SUCCESS),
        result => result.context("Failed writing summary")?,
    }

    if report.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} every worker failed", "Error:".red().bold());
        Ok(ExitCode::FAILURE)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

fn print_summary<S>(report: &SearchReport<S>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if report.interrupted() {
        writeln!(out, "Search stopped, found {} files", report.matches)
    } else {
        writeln!(out, "Done searching, found {} files", report.matches)
    }
}
