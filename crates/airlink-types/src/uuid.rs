//! Bluetooth UUIDs for airlink peripherals.
//!
//! This module contains the fixed service and characteristic identifiers
//! used to reach the sensor's notification stream. These are configuration
//! constants, not protocol logic.

use uuid::{Uuid, uuid};

/// Custom user service exposed by the sensor peripheral.
pub const SENSOR_SERVICE: Uuid = uuid!("7ebad564-1669-4bd7-abc8-1c9c4d2dcc26");

/// Notify characteristic carrying the packed sensor reading.
pub const SENSOR_NOTIFY: Uuid = uuid!("a4f521de-ea92-4269-9e4f-16a8cac25178");
