//! Core types for airlink sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Number of bytes required to parse a [`SensorReading`].
pub const MIN_READING_BYTES: usize = 6;

/// A decoded sensor reading from a peripheral's notify characteristic.
///
/// Readings are transient: one is produced per notification (or manual
/// read) and replaces the previous one; nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// CO2 concentration in ppm.
    pub co2: i16,
    /// Total volatile organic compounds in ppb.
    pub tvoc: i16,
}

impl SensorReading {
    /// Parse a `SensorReading` from a raw notification payload.
    ///
    /// The byte layout is fixed, little-endian:
    /// - bytes 0-1: temperature (i16 LE, divide by 100 for Celsius)
    /// - bytes 2-3: CO2 in ppm (i16 LE)
    /// - bytes 4-5: TVOC in ppb (i16 LE)
    ///
    /// Bytes beyond the sixth are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::TooShort`] if `data` contains fewer than
    /// [`MIN_READING_BYTES`] (6) bytes. The buffer is never read out of
    /// bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use airlink_types::SensorReading;
    ///
    /// let reading = SensorReading::from_bytes(&[0xE8, 0x03, 0x10, 0x00, 0x05, 0x00]).unwrap();
    /// assert!((reading.temperature - 10.0).abs() < 0.001);
    /// assert_eq!(reading.co2, 16);
    /// assert_eq!(reading.tvoc, 5);
    /// ```
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        use bytes::Buf;

        if data.len() < MIN_READING_BYTES {
            return Err(ParseError::TooShort {
                expected: MIN_READING_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let temp_raw = buf.get_i16_le();
        let co2 = buf.get_i16_le();
        let tvoc = buf.get_i16_le();

        Ok(SensorReading {
            temperature: f32::from(temp_raw) / 100.0,
            co2,
            tvoc,
        })
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} °C, {} ppm CO2, {} ppb TVOC",
            self.temperature, self.co2, self.tvoc
        )
    }
}
