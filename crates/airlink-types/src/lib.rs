//! Platform-agnostic types for airlink sensor peripherals.
//!
//! This crate provides shared types that can be used by both native
//! (airlink-core) and WebAssembly (airlink-wasm) implementations.
//!
//! # Features
//!
//! - The decoded sensor reading and its fixed-layout binary parser
//! - UUID constants for the sensor's BLE service and characteristic
//! - Error types for data parsing
//!
//! # Example
//!
//! ```
//! use airlink_types::SensorReading;
//!
//! let reading = SensorReading::from_bytes(&[0xE8, 0x03, 0x10, 0x00, 0x05, 0x00]).unwrap();
//! assert_eq!(reading.co2, 16);
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{MIN_READING_BYTES, SensorReading};
pub use uuid as uuids;

#[cfg(test)]
mod tests {
    use super::*;

    // --- SensorReading parsing tests ---

    #[test]
    fn test_parse_reading_from_valid_bytes() {
        // Temperature: 1000 raw (10.00°C = 1000/100) -> [0xE8, 0x03]
        // CO2: 16 ppm -> [0x10, 0x00]
        // TVOC: 5 ppb -> [0x05, 0x00]
        let bytes: [u8; 6] = [0xE8, 0x03, 0x10, 0x00, 0x05, 0x00];

        let reading = SensorReading::from_bytes(&bytes).unwrap();

        assert!((reading.temperature - 10.0).abs() < 0.001);
        assert_eq!(reading.co2, 16);
        assert_eq!(reading.tvoc, 5);
    }

    #[test]
    fn test_parse_reading_from_insufficient_bytes() {
        let bytes: [u8; 4] = [0xE8, 0x03, 0x10, 0x00]; // Only 4 bytes, need 6

        let result = SensorReading::from_bytes(&bytes);

        assert_eq!(
            result.unwrap_err(),
            ParseError::TooShort {
                expected: 6,
                actual: 4
            }
        );
    }

    #[test]
    fn test_parse_reading_zero_bytes() {
        let result = SensorReading::from_bytes(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_reading_all_zeros() {
        let reading = SensorReading::from_bytes(&[0; 6]).unwrap();
        assert!((reading.temperature - 0.0).abs() < 0.001);
        assert_eq!(reading.co2, 0);
        assert_eq!(reading.tvoc, 0);
    }

    #[test]
    fn test_parse_reading_negative_temperature() {
        // -12.34°C = -1234 raw = 0xFB2E as i16 LE -> [0x2E, 0xFB]
        let bytes: [u8; 6] = [0x2E, 0xFB, 0x90, 0x01, 0x0A, 0x00];

        let reading = SensorReading::from_bytes(&bytes).unwrap();

        assert!((reading.temperature - (-12.34)).abs() < 0.001);
        assert_eq!(reading.co2, 400);
        assert_eq!(reading.tvoc, 10);
    }

    #[test]
    fn test_parse_reading_extra_bytes_ignored() {
        // More than 6 bytes should work (extra bytes ignored)
        let bytes: [u8; 9] = [0xE8, 0x03, 0x10, 0x00, 0x05, 0x00, 0xAA, 0xBB, 0xCC];

        let reading = SensorReading::from_bytes(&bytes).unwrap();
        assert_eq!(reading.co2, 16);
    }

    #[test]
    fn test_parse_reading_extreme_values() {
        // i16::MIN = 0x8000 LE -> [0x00, 0x80], i16::MAX = 0x7FFF LE -> [0xFF, 0x7F]
        let bytes: [u8; 6] = [0x00, 0x80, 0xFF, 0x7F, 0x00, 0x80];

        let reading = SensorReading::from_bytes(&bytes).unwrap();
        assert!((reading.temperature - (-327.68)).abs() < 0.001);
        assert_eq!(reading.co2, i16::MAX);
        assert_eq!(reading.tvoc, i16::MIN);
    }

    // --- ParseError tests ---

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::TooShort {
            expected: 6,
            actual: 4,
        };
        assert_eq!(err.to_string(), "payload too short: requires 6 bytes, got 4");
    }

    // --- Display tests ---

    #[test]
    fn test_reading_display() {
        let reading = SensorReading {
            temperature: 21.5,
            co2: 450,
            tvoc: 12,
        };
        assert_eq!(reading.to_string(), "21.50 °C, 450 ppm CO2, 12 ppb TVOC");
    }

    // --- Serialization tests ---

    #[test]
    fn test_reading_serialization_roundtrip() {
        let reading = SensorReading {
            temperature: 22.5,
            co2: 800,
            tvoc: 30,
        };

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"co2\":800"));
        assert!(json.contains("\"tvoc\":30"));

        let deserialized: SensorReading = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, reading);
    }
}
