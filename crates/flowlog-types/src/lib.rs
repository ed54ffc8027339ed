//! Platform-agnostic types for the flowlog serial logger.
//!
//! This crate provides the shared data model used by the acquisition side
//! (flowlog-core), the persistence and reporting side (flowlog-store), and
//! the command-line front end.
//!
//! # Features
//!
//! - [`Record`]: a timestamped value as persisted in the stats file
//! - [`DayBucket`]: the local-calendar key used when reporting
//! - Fixed line settings and the unit-scaling constant
//! - Error types for value parsing
//!
//! # Example
//!
//! ```
//! use flowlog_types::{Record, GRAMS_PER_SECOND};
//!
//! let record = Record::new(1_700_000_000, 2.0);
//! assert_eq!(record.value * GRAMS_PER_SECOND, 20.0);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{DayBucket, Record, parse_value};

/// Unit-scaling constant K: grams dispensed per second of reported flow.
///
/// Applied at report time only; stored values are never pre-scaled.
pub const GRAMS_PER_SECOND: f64 = 10.0;

/// Marker the dispenser firmware prints before each bracketed duration.
pub const DEFAULT_MARKER: &str = "Duration:";

/// Serial line speed. Framing is always 8 data bits, no parity, 1 stop bit.
pub const BAUD_RATE: u32 = 115_200;

/// Upper bound on bytes held by the pattern scanner before it resets.
pub const SCAN_BUFFER_CAPACITY: usize = 4096;

