//! Trait abstraction over the host BLE platform.
//!
//! The controller never talks to a Bluetooth stack directly; it drives a
//! [`Platform`], which the host supplies. The native implementation is
//! [`crate::native::NativePlatform`] (btleplug); tests use
//! [`crate::mock::MockPlatform`].
//!
//! Disconnects and characteristic notifications are asynchronous hardware
//! events that arrive independently of any call stack. They are modeled as a
//! broadcast channel of [`PlatformEvent`] whose subscription lifetime belongs
//! to the controller, not to any UI element.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;

/// A device surfaced by discovery.
///
/// The device itself is owned by the platform; this is the plain-data view
/// the controller works with. The signal strength is refreshed in place on
/// repeat sightings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedDevice {
    /// Stable opaque identifier (MAC address, peripheral UUID, ...).
    pub id: String,
    /// Display name, if the advertisement carried one.
    pub name: Option<String>,
    /// Signal strength in dBm, if reported.
    pub rssi: Option<i16>,
}

/// Opaque handle to a resolved characteristic on a connected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicHandle {
    /// The device the characteristic lives on.
    pub device_id: String,
    /// The containing service UUID.
    pub service: Uuid,
    /// The characteristic UUID.
    pub characteristic: Uuid,
}

/// Asynchronous events pushed by the platform.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// The link to a device closed, whether user-initiated or link loss.
    Disconnected {
        /// The device identifier.
        id: String,
    },
    /// A subscribed characteristic delivered a new value.
    ValueChanged {
        /// The device identifier.
        id: String,
        /// The raw notification payload.
        value: Vec<u8>,
    },
}

/// Capability-shaped interface to the host BLE platform.
///
/// Every method is a potential suspension point; the controller assumes
/// nothing about ordering across concurrently pending calls.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Check whether the platform's Bluetooth capability is currently usable.
    async fn availability(&self) -> Result<bool>;

    /// Request visibility of one device.
    ///
    /// Resolves when the platform surfaces a device (new or already seen) or
    /// deems discovery exhausted for this call, in which case it errors.
    async fn request_device(&self) -> Result<AdvertisedDevice>;

    /// Establish a link to the device.
    async fn connect(&self, id: &str) -> Result<()>;

    /// Trigger a disconnect. Completion arrives as
    /// [`PlatformEvent::Disconnected`], not as this call's return.
    async fn disconnect(&self, id: &str) -> Result<()>;

    /// Resolve a characteristic through the two-stage lookup: service by
    /// UUID on the device, then characteristic by UUID within that service.
    async fn resolve_characteristic(
        &self,
        id: &str,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<CharacteristicHandle>;

    /// Start the notification stream for a characteristic.
    async fn subscribe(&self, handle: &CharacteristicHandle) -> Result<()>;

    /// Stop the notification stream for a characteristic.
    async fn unsubscribe(&self, handle: &CharacteristicHandle) -> Result<()>;

    /// Read the characteristic's current value.
    async fn read_value(&self, handle: &CharacteristicHandle) -> Result<Vec<u8>>;

    /// Subscribe to the platform's asynchronous event stream.
    fn events(&self) -> broadcast::Receiver<PlatformEvent>;
}
