//! Serial acquisition library for the flowlog logger.
//!
//! This crate talks to a dispenser controller over a serial line, waits for
//! a marker such as `Duration:` followed by a bracketed value, and turns each
//! extracted value into a timestamped [`Record`].
//!
//! # Features
//!
//! - **Serial channel**: fixed 115200-8-N-1 raw line settings, blocking reads
//!   bounded by a poll interval so cancellation is observed
//! - **Pattern scanner**: bounded accumulator, chunking-independent matching
//! - **Acquisition loop**: one fresh channel per extraction, backoff on failure,
//!   cancellable at any suspension point
//! - **Mock channel**: scripted input for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use flowlog_core::{AcquireOptions, SerialChannel, acquire};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let summary = acquire::run(
//!     || SerialChannel::open("/dev/ttyUSB0"),
//!     |record: &flowlog_types::Record| {
//!         println!("{record}");
//!         Ok::<_, std::io::Error>(())
//!     },
//!     &AcquireOptions::default(),
//!     &cancel,
//! )?;
//! println!("Logged {} records", summary.records);
//! # Ok::<(), flowlog_core::Error>(())
//! ```

pub mod acquire;
pub mod error;
pub mod mock;
pub mod reopen;
pub mod scanner;
pub mod serial;
pub mod traits;

pub use acquire::{AcquireOptions, AcquireSummary};
pub use error::{Error, Result};
pub use mock::{MockChannel, MockChannelBuilder};
pub use reopen::ReopenOptions;
pub use scanner::PatternScanner;
pub use serial::SerialChannel;
pub use traits::ByteChannel;

// Re-export from flowlog-types
pub use flowlog_types::{DEFAULT_MARKER, Record};
