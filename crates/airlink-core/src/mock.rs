//! Mock platform implementation for testing.
//!
//! This module provides a scriptable [`Platform`] that can be used for unit
//! and integration testing without BLE hardware.
//!
//! # Features
//!
//! - **Scripted availability**: queue a sequence of availability answers to
//!   exercise the discovery backoff
//! - **Queued advertisements**: control exactly which devices discovery sees
//! - **Failure injection**: make connect, resolution, or subscribe fail
//! - **Operation counters**: assert how many platform calls an operation made
//! - **Event injection**: push disconnects and value changes from tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{ConnectionFailureReason, Error, Result};
use crate::traits::{AdvertisedDevice, CharacteristicHandle, Platform, PlatformEvent};

/// A scriptable in-memory platform for tests.
///
/// # Example
///
/// ```
/// use airlink_core::{MockPlatform, Platform};
///
/// #[tokio::main]
/// async fn main() {
///     let platform = MockPlatform::new();
///     platform.connect("dev-1").await.unwrap();
///     assert_eq!(platform.connect_calls(), 1);
/// }
/// ```
pub struct MockPlatform {
    availability_script: Mutex<VecDeque<bool>>,
    default_available: AtomicBool,
    advertisements: Mutex<VecDeque<AdvertisedDevice>>,
    read_payload: Mutex<Vec<u8>>,
    events: broadcast::Sender<PlatformEvent>,
    availability_checks: AtomicU32,
    request_calls: AtomicU32,
    connect_calls: AtomicU32,
    disconnect_calls: AtomicU32,
    subscribe_calls: AtomicU32,
    unsubscribe_calls: AtomicU32,
    read_calls: AtomicU32,
    fail_connect: AtomicBool,
    fail_resolve: AtomicBool,
    fail_subscribe: AtomicBool,
    /// Simulated connect latency in milliseconds (0 = no delay).
    connect_latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPlatform")
            .field("connect_calls", &self.connect_calls.load(Ordering::Relaxed))
            .field(
                "subscribe_calls",
                &self.subscribe_calls.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a mock platform that is available and succeeds everywhere.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            availability_script: Mutex::new(VecDeque::new()),
            default_available: AtomicBool::new(true),
            advertisements: Mutex::new(VecDeque::new()),
            read_payload: Mutex::new(vec![0xE8, 0x03, 0x10, 0x00, 0x05, 0x00]),
            events,
            availability_checks: AtomicU32::new(0),
            request_calls: AtomicU32::new(0),
            connect_calls: AtomicU32::new(0),
            disconnect_calls: AtomicU32::new(0),
            subscribe_calls: AtomicU32::new(0),
            unsubscribe_calls: AtomicU32::new(0),
            read_calls: AtomicU32::new(0),
            fail_connect: AtomicBool::new(false),
            fail_resolve: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            connect_latency_ms: AtomicU64::new(0),
        }
    }

    /// Create a mock advertisement with a random identifier.
    pub fn random_advertisement(name: &str) -> AdvertisedDevice {
        AdvertisedDevice {
            id: format!("MOCK-{:06X}", rand::random::<u32>() % 0xFF_FFFF),
            name: Some(name.to_string()),
            rssi: Some(-50),
        }
    }

    // --- Test control methods ---

    /// Queue availability answers; once exhausted the default answer is used.
    pub fn script_availability(&self, answers: impl IntoIterator<Item = bool>) {
        self.availability_script
            .lock()
            .unwrap()
            .extend(answers);
    }

    /// Set the answer used when the availability script is exhausted.
    pub fn set_available(&self, available: bool) {
        self.default_available.store(available, Ordering::Relaxed);
    }

    /// Queue a device for the next discovery request.
    pub fn push_advertisement(&self, device: AdvertisedDevice) {
        self.advertisements.lock().unwrap().push_back(device);
    }

    /// Set the payload returned by [`Platform::read_value`].
    pub fn set_read_payload(&self, payload: Vec<u8>) {
        *self.read_payload.lock().unwrap() = payload;
    }

    /// Make connect attempts fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::Relaxed);
    }

    /// Make characteristic resolution fail.
    pub fn set_fail_resolve(&self, fail: bool) {
        self.fail_resolve.store(fail, Ordering::Relaxed);
    }

    /// Make subscribe calls fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
    }

    /// Delay connect resolution, leaving the attempt observable in flight.
    pub fn set_connect_latency(&self, latency: Duration) {
        self.connect_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Push a disconnect event, as the platform would on link loss.
    pub fn emit_disconnect(&self, id: &str) {
        let _ = self.events.send(PlatformEvent::Disconnected { id: id.to_string() });
    }

    /// Push a characteristic notification.
    pub fn emit_value(&self, id: &str, value: Vec<u8>) {
        let _ = self.events.send(PlatformEvent::ValueChanged {
            id: id.to_string(),
            value,
        });
    }

    // --- Counters ---

    /// Number of availability checks performed.
    pub fn availability_checks(&self) -> u32 {
        self.availability_checks.load(Ordering::Relaxed)
    }

    /// Number of discovery requests performed.
    pub fn request_calls(&self) -> u32 {
        self.request_calls.load(Ordering::Relaxed)
    }

    /// Number of connect calls performed.
    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::Relaxed)
    }

    /// Number of disconnect calls performed.
    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls.load(Ordering::Relaxed)
    }

    /// Number of subscribe calls performed.
    pub fn subscribe_calls(&self) -> u32 {
        self.subscribe_calls.load(Ordering::Relaxed)
    }

    /// Number of unsubscribe calls performed.
    pub fn unsubscribe_calls(&self) -> u32 {
        self.unsubscribe_calls.load(Ordering::Relaxed)
    }

    /// Number of read calls performed.
    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn availability(&self) -> Result<bool> {
        self.availability_checks.fetch_add(1, Ordering::Relaxed);
        let scripted = self.availability_script.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| self.default_available.load(Ordering::Relaxed)))
    }

    async fn request_device(&self) -> Result<AdvertisedDevice> {
        self.request_calls.fetch_add(1, Ordering::Relaxed);
        self.advertisements
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::DiscoveryFailed("no devices in range".to_string()))
    }

    async fn connect(&self, id: &str) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::Relaxed);

        let latency = self.connect_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.fail_connect.load(Ordering::Relaxed) {
            return Err(Error::connection_failed(
                Some(id.to_string()),
                ConnectionFailureReason::Rejected,
            ));
        }
        Ok(())
    }

    async fn disconnect(&self, id: &str) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::Relaxed);
        // Completion is asynchronous, exactly like real hardware.
        self.emit_disconnect(id);
        Ok(())
    }

    async fn resolve_characteristic(
        &self,
        id: &str,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<CharacteristicHandle> {
        if self.fail_resolve.load(Ordering::Relaxed) {
            return Err(Error::service_not_found(service));
        }
        Ok(CharacteristicHandle {
            device_id: id.to_string(),
            service,
            characteristic,
        })
    }

    async fn subscribe(&self, _handle: &CharacteristicHandle) -> Result<()> {
        self.subscribe_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(Error::connection_failed_str(
                None,
                "subscribe rejected by device",
            ));
        }
        Ok(())
    }

    async fn unsubscribe(&self, _handle: &CharacteristicHandle) -> Result<()> {
        self.unsubscribe_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn read_value(&self, _handle: &CharacteristicHandle) -> Result<Vec<u8>> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.read_payload.lock().unwrap().clone())
    }

    fn events(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_availability_script_then_default() {
        let platform = MockPlatform::new();
        platform.script_availability([false, true]);

        assert!(!platform.availability().await.unwrap());
        assert!(platform.availability().await.unwrap());
        // Script exhausted, default answer applies.
        assert!(platform.availability().await.unwrap());
        assert_eq!(platform.availability_checks(), 3);
    }

    #[tokio::test]
    async fn test_request_device_drains_queue() {
        let platform = MockPlatform::new();
        platform.push_advertisement(AdvertisedDevice {
            id: "dev-1".to_string(),
            name: None,
            rssi: None,
        });

        assert_eq!(platform.request_device().await.unwrap().id, "dev-1");
        assert!(platform.request_device().await.is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_injection() {
        let platform = MockPlatform::new();
        platform.set_fail_connect(true);

        let err = platform.connect("dev-1").await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed { .. }));
    }
}
