//! Error types for flowlog-core.
//!
//! This module defines all error types that can occur while talking to the
//! serial device and running the acquisition loop.
//!
//! # Error Recovery Strategies
//!
//! The core never retries on its own. The acquisition loop in
//! [`crate::acquire`] decides what to do with each failure:
//!
//! | Error Type | Strategy |
//! |------------|----------|
//! | [`Error::DeviceOpen`] | Reopen after backoff |
//! | [`Error::DeviceConfig`] | Reopen after backoff |
//! | [`Error::DeviceRead`] | Reopen after backoff |
//! | [`Error::DeviceWrite`] | Report to the caller |
//! | [`Error::Timeout`] | Reopen after backoff |
//! | [`Error::Cancelled`] | Stop, not a failure |
//! | [`Error::Sink`] | Stop, the record could not be persisted |
//! | [`Error::InvalidConfig`] | Fix configuration and restart |

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when acquiring data from a serial device.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The device could not be opened or its line settings could not be
    /// applied by the OS.
    #[error("Error opening port {path}: {reason}")]
    DeviceOpen {
        /// Device path that failed to open.
        path: String,
        /// Reason reported by the OS.
        reason: String,
    },

    /// The requested line settings were rejected as invalid (for example an
    /// unsupported baud rate). OS-level configuration failures are reported
    /// as [`Error::DeviceOpen`].
    #[error("Error configuring port {path}: {reason}")]
    DeviceConfig {
        /// Device path that failed to configure.
        path: String,
        /// Reason reported by the OS.
        reason: String,
    },

    /// Reading from the device failed.
    #[error("Read from serial device failed: {0}")]
    DeviceRead(#[source] std::io::Error),

    /// Writing to the device failed.
    #[error("Write to serial device failed: {0}")]
    DeviceWrite(#[source] std::io::Error),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The record sink failed to persist a record.
    #[error("Failed to persist record: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a device open error.
    pub fn device_open(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::DeviceOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a device configuration error.
    pub fn device_config(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::DeviceConfig {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the acquisition loop should reopen the device and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DeviceOpen { .. }
                | Self::DeviceConfig { .. }
                | Self::DeviceRead(_)
                | Self::Timeout { .. }
        )
    }
}

/// Result type alias using flowlog-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_open_display() {
        let err = Error::device_open("/dev/ttyUSB0", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Error opening port /dev/ttyUSB0: No such file or directory"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout("scan", Duration::from_secs(5));
        assert_eq!(err.to_string(), "Operation 'scan' timed out after 5s");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::device_open("p", "gone").is_recoverable());
        assert!(Error::device_config("p", "bad baud").is_recoverable());
        assert!(
            Error::DeviceRead(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "x"))
                .is_recoverable()
        );
        assert!(Error::timeout("scan", Duration::from_millis(1)).is_recoverable());

        assert!(!Error::Cancelled.is_recoverable());
        assert!(!Error::invalid_config("empty marker").is_recoverable());
        assert!(
            !Error::Sink(Box::new(std::io::Error::other("disk full"))).is_recoverable()
        );
    }
}
