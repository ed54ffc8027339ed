//! Local persistence and reporting for flowlog records.
//!
//! This crate owns the stats file: an append-only CSV log with one
//! `<unix_seconds>,<value>` line per recorded measurement.
//!
//! # Features
//!
//! - [`StatsStore`]: durable append of [`Record`](flowlog_types::Record)s
//! - [`scan`]: lazy, restartable read-back that skips malformed lines
//! - [`StatsReporter`]: today's entries, today's total and the all-time
//!   average per day, bucketed by local calendar day
//!
//! # Example
//!
//! ```no_run
//! use flowlog_store::{StatsReporter, StatsStore};
//! use flowlog_types::Record;
//!
//! let mut store = StatsStore::open_default()?;
//! store.append(&Record::now(2.5))?;
//!
//! let report = StatsReporter::local().report(store.path())?;
//! print!("{}", report.to_text());
//! # Ok::<(), flowlog_store::Error>(())
//! ```

mod error;
mod report;
mod store;

pub use error::{Error, Result};
pub use report::{DailyReport, ReportEntry, StatsReporter};
pub use store::{Records, StatsStore, append, scan};

/// Default stats file path following platform conventions.
///
/// - Linux: `~/.local/share/flowlog/stats.csv`
/// - macOS: `~/Library/Application Support/flowlog/stats.csv`
/// - Windows: `C:\Users\<user>\AppData\Local\flowlog\stats.csv`
pub fn default_stats_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("flowlog")
        .join("stats.csv")
}
