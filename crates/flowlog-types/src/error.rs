//! Error types for record parsing in flowlog-types.

use thiserror::Error;

/// Errors that can occur when turning raw text into flowlog values.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    /// The extracted value is not a decimal number.
    #[error("Invalid value '{0}': not a decimal number")]
    InvalidValue(String),

    /// The value parsed but is NaN or infinite.
    #[error("Invalid value '{0}': not a finite number")]
    NonFinite(String),
}

/// Result type alias using flowlog-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
