//! Error types for data parsing in airlink-types.

use thiserror::Error;

/// Errors that can occur when parsing sensor payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in airlink-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload contains fewer bytes than the fixed layout requires.
    #[error("payload too short: requires {expected} bytes, got {actual}")]
    TooShort {
        /// Number of bytes the layout requires.
        expected: usize,
        /// Number of bytes actually received.
        actual: usize,
    },
}

/// Result type alias using airlink-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
