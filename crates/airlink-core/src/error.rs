//! Error types for airlink-core.
//!
//! This module defines all error types that can occur while orchestrating
//! the connection lifecycle of sensor peripherals.
//!
//! # Recovery policy
//!
//! | Error | Class | Handling |
//! |-------|-------|----------|
//! | [`Error::AdapterUnavailable`] | recoverable | discovery backs off and re-polls, never gives up |
//! | [`Error::DiscoveryFailed`] | recoverable | reported, discovery continues after backoff |
//! | [`Error::ConnectionFailed`] | recoverable per device | device enters `Error` status, user may retry |
//! | [`Error::AlreadyConnected`] | user error | rejected synchronously, no state change |
//! | [`Error::NotConnected`] | user error | operation aborted, caller prompts the user |
//! | [`Error::ServiceNotFound`] / [`Error::CharacteristicNotFound`] | fatal for the operation | surfaced, no state corruption |
//! | [`Error::Reading`] | fatal for the reading | previous reading left intact |

use thiserror::Error;

use airlink_types::ParseError;

/// Errors that can occur when driving sensor peripherals.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error from the native backend.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// No usable Bluetooth adapter, or the platform reports itself unavailable.
    #[error("Bluetooth adapter unavailable")]
    AdapterUnavailable,

    /// A discovery request failed.
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    /// A connection attempt failed.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// The device identifier that failed to connect, if known.
        device_id: Option<String>,
        /// The structured reason for the failure.
        reason: ConnectionFailureReason,
    },

    /// A connection attempt or established link already exists for this device.
    #[error("already connected or connecting to device: {id}")]
    AlreadyConnected {
        /// The device identifier.
        id: String,
    },

    /// Operation attempted while not connected to the device.
    #[error("not connected to device")]
    NotConnected,

    /// Required GATT service not found on the device.
    #[error("service not found: {uuid}")]
    ServiceNotFound {
        /// The service UUID that was not found.
        uuid: String,
    },

    /// Required GATT characteristic not found within the resolved service.
    #[error("characteristic not found: {uuid} in service {service}")]
    CharacteristicNotFound {
        /// The characteristic UUID that was not found.
        uuid: String,
        /// The service that was searched.
        service: String,
    },

    /// Device not found among known peripherals.
    #[error("device not found: {id}")]
    DeviceNotFound {
        /// The device identifier.
        id: String,
    },

    /// Failed to decode a sensor payload.
    #[error("invalid reading: {0}")]
    Reading(#[from] ParseError),

    /// Operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

/// Structured reasons for connection failures.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionFailureReason {
    /// Bluetooth adapter not available or powered off.
    AdapterUnavailable,
    /// Device is out of range.
    OutOfRange,
    /// Device rejected the connection.
    Rejected,
    /// Connection attempt timed out.
    Timeout,
    /// Generic BLE error.
    BleError(String),
    /// Other/unknown error.
    Other(String),
}

impl std::fmt::Display for ConnectionFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdapterUnavailable => write!(f, "Bluetooth adapter unavailable"),
            Self::OutOfRange => write!(f, "device out of range"),
            Self::Rejected => write!(f, "connection rejected by device"),
            Self::Timeout => write!(f, "connection timed out"),
            Self::BleError(msg) => write!(f, "BLE error: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error {
    /// Create a connection failure with structured reason.
    pub fn connection_failed(device_id: Option<String>, reason: ConnectionFailureReason) -> Self {
        Self::ConnectionFailed { device_id, reason }
    }

    /// Create a connection failure with a string reason.
    pub fn connection_failed_str(device_id: Option<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            device_id,
            reason: ConnectionFailureReason::Other(reason.into()),
        }
    }

    /// Create an already-connected error for a specific device.
    pub fn already_connected(id: impl Into<String>) -> Self {
        Self::AlreadyConnected { id: id.into() }
    }

    /// Create a device-not-found error for a specific identifier.
    pub fn device_not_found(id: impl Into<String>) -> Self {
        Self::DeviceNotFound { id: id.into() }
    }

    /// Create a service-not-found error.
    pub fn service_not_found(uuid: impl std::fmt::Display) -> Self {
        Self::ServiceNotFound {
            uuid: uuid.to_string(),
        }
    }

    /// Create a characteristic-not-found error.
    pub fn characteristic_not_found(
        uuid: impl std::fmt::Display,
        service: impl std::fmt::Display,
    ) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.to_string(),
            service: service.to_string(),
        }
    }
}

/// Result type alias using airlink-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::already_connected("dev-1");
        assert_eq!(
            err.to_string(),
            "already connected or connecting to device: dev-1"
        );

        let err = Error::NotConnected;
        assert_eq!(err.to_string(), "not connected to device");

        let err = Error::characteristic_not_found("a4f5", "7eba");
        assert!(err.to_string().contains("a4f5"));
        assert!(err.to_string().contains("7eba"));

        let err = Error::AdapterUnavailable;
        assert_eq!(err.to_string(), "Bluetooth adapter unavailable");
    }

    #[test]
    fn test_connection_failure_reasons() {
        let err = Error::connection_failed(
            Some("dev-1".to_string()),
            ConnectionFailureReason::OutOfRange,
        );
        assert!(err.to_string().contains("out of range"));

        let err = Error::connection_failed_str(None, "stack shut down");
        assert!(err.to_string().contains("stack shut down"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = ParseError::TooShort {
            expected: 6,
            actual: 4,
        };
        let err: Error = parse.into();
        assert!(matches!(err, Error::Reading(_)));
        assert!(err.to_string().contains("6 bytes"));
    }
}
