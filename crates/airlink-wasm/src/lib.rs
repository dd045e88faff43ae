//! WebAssembly bindings for airlink sensors via Web Bluetooth.
//!
//! A browser page drives the Web Bluetooth API directly (requestDevice,
//! gatt.connect, startNotifications) and hands raw notification payloads to
//! this module for decoding. The fixed service and characteristic UUIDs are
//! exported so the page and the decoder always agree on them.

use wasm_bindgen::prelude::*;

use airlink_types::{SensorReading, uuids};

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    log("airlink WASM module initialized");
}

/// UUID of the sensor's user service, for `getPrimaryService()`.
#[wasm_bindgen]
pub fn sensor_service_uuid() -> String {
    uuids::SENSOR_SERVICE.to_string()
}

/// UUID of the sensor's notify characteristic, for `getCharacteristic()`.
#[wasm_bindgen]
pub fn sensor_notify_uuid() -> String {
    uuids::SENSOR_NOTIFY.to_string()
}

/// Decode a notification payload into a `{temperature, co2, tvoc}` object.
///
/// Throws a string error if the payload is shorter than the fixed layout
/// requires; the page keeps its previous reading in that case.
#[wasm_bindgen]
pub fn decode_reading(data: &[u8]) -> Result<JsValue, JsValue> {
    let reading = SensorReading::from_bytes(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let json = serde_json::to_string(&reading).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

/// Log a message to the browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}
