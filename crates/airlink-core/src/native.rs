//! Native platform backend built on btleplug.
//!
//! Adapts the host's Bluetooth stack to the [`Platform`] trait: scan-based
//! discovery, GATT connect/disconnect, two-stage characteristic resolution,
//! and a pump that forwards adapter disconnect events and notification
//! streams into the platform event channel.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CentralState, Characteristic, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::traits::{AdvertisedDevice, CharacteristicHandle, Platform, PlatformEvent};

/// Default scan window for one discovery request.
const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(1);

/// [`Platform`] implementation backed by the first available BLE adapter.
pub struct NativePlatform {
    adapter: Adapter,
    events: broadcast::Sender<PlatformEvent>,
    scan_window: Duration,
    /// Round-robin cursor so repeated discovery requests surface every
    /// peripheral in range, one per call.
    scan_cursor: Mutex<usize>,
}

impl std::fmt::Debug for NativePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePlatform")
            .field("scan_window", &self.scan_window)
            .finish_non_exhaustive()
    }
}

impl NativePlatform {
    /// Create a platform on the first available adapter.
    pub async fn new() -> Result<Self> {
        Self::with_scan_window(DEFAULT_SCAN_WINDOW).await
    }

    /// Create a platform with a custom scan window per discovery request.
    pub async fn with_scan_window(scan_window: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::AdapterUnavailable)?;

        let (events, _) = broadcast::channel(64);

        // Adapter-level events outlive any single connection; the forwarder
        // runs for the life of the platform.
        let mut central_events = adapter.events().await?;
        let sender = events.clone();
        tokio::spawn(async move {
            while let Some(event) = central_events.next().await {
                if let CentralEvent::DeviceDisconnected(id) = event {
                    let _ = sender.send(PlatformEvent::Disconnected {
                        id: peripheral_id_string(&id),
                    });
                }
            }
            debug!("central event stream ended");
        });

        Ok(Self {
            adapter,
            events,
            scan_window,
            scan_cursor: Mutex::new(0),
        })
    }

    /// Find a known peripheral by its identifier string.
    async fn peripheral(&self, id: &str) -> Result<Peripheral> {
        let id_lower = id.to_lowercase();
        for peripheral in self.adapter.peripherals().await? {
            if let Ok(Some(props)) = peripheral.properties().await
                && identifier(&props.address.to_string(), &peripheral.id()).to_lowercase()
                    == id_lower
            {
                return Ok(peripheral);
            }
        }
        Err(Error::device_not_found(id))
    }

    /// Find the concrete characteristic a handle refers to.
    fn characteristic(
        peripheral: &Peripheral,
        handle: &CharacteristicHandle,
    ) -> Result<Characteristic> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == handle.characteristic && c.service_uuid == handle.service)
            .ok_or_else(|| Error::characteristic_not_found(handle.characteristic, handle.service))
    }
}

#[async_trait]
impl Platform for NativePlatform {
    async fn availability(&self) -> Result<bool> {
        let state = self.adapter.adapter_state().await?;
        Ok(state == CentralState::PoweredOn)
    }

    async fn request_device(&self) -> Result<AdvertisedDevice> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        sleep(self.scan_window).await;
        self.adapter.stop_scan().await?;

        let mut devices = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            match peripheral.properties().await {
                Ok(Some(props)) => devices.push(AdvertisedDevice {
                    id: identifier(&props.address.to_string(), &peripheral.id()),
                    name: props.local_name.clone(),
                    rssi: props.rssi,
                }),
                Ok(None) => {}
                Err(e) => debug!("error reading peripheral properties: {}", e),
            }
        }

        if devices.is_empty() {
            return Err(Error::DiscoveryFailed("no peripherals in range".to_string()));
        }

        // One device per call; the cursor walks the list so every peripheral
        // gets surfaced (and re-surfaced, refreshing its RSSI) over time.
        let mut cursor = self.scan_cursor.lock().expect("scan cursor poisoned");
        let device = devices[*cursor % devices.len()].clone();
        *cursor = cursor.wrapping_add(1);
        Ok(device)
    }

    async fn connect(&self, id: &str) -> Result<()> {
        let peripheral = self.peripheral(id).await?;
        peripheral.connect().await?;
        peripheral.discover_services().await?;
        info!("connected to {}", id);

        // Forward this connection's notification stream into the shared
        // event channel. The stream ends when the link closes, so a
        // reconnect simply spawns a fresh forwarder.
        let mut notifications = peripheral.notifications().await?;
        let sender = self.events.clone();
        let device_id = id.to_string();
        tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                let _ = sender.send(PlatformEvent::ValueChanged {
                    id: device_id.clone(),
                    value: notification.value,
                });
            }
            debug!("notification stream ended for {}", device_id);
        });

        Ok(())
    }

    async fn disconnect(&self, id: &str) -> Result<()> {
        let peripheral = self.peripheral(id).await?;
        peripheral.disconnect().await?;
        // The state transition is driven by the adapter's
        // DeviceDisconnected event, same as for link loss.
        Ok(())
    }

    async fn resolve_characteristic(
        &self,
        id: &str,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<CharacteristicHandle> {
        let peripheral = self.peripheral(id).await?;

        let service_entry = peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == service)
            .ok_or_else(|| Error::service_not_found(service))?;

        let characteristic_entry = service_entry
            .characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .ok_or_else(|| Error::characteristic_not_found(characteristic, service))?;

        Ok(CharacteristicHandle {
            device_id: id.to_string(),
            service,
            characteristic: characteristic_entry.uuid,
        })
    }

    async fn subscribe(&self, handle: &CharacteristicHandle) -> Result<()> {
        let peripheral = self.peripheral(&handle.device_id).await?;
        let characteristic = Self::characteristic(&peripheral, handle)?;
        peripheral.subscribe(&characteristic).await?;
        Ok(())
    }

    async fn unsubscribe(&self, handle: &CharacteristicHandle) -> Result<()> {
        let peripheral = self.peripheral(&handle.device_id).await?;
        let characteristic = Self::characteristic(&peripheral, handle)?;
        if let Err(e) = peripheral.unsubscribe(&characteristic).await {
            warn!("unsubscribe failed for {}: {}", handle.device_id, e);
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_value(&self, handle: &CharacteristicHandle) -> Result<Vec<u8>> {
        let peripheral = self.peripheral(&handle.device_id).await?;
        let characteristic = Self::characteristic(&peripheral, handle)?;
        Ok(peripheral.read(&characteristic).await?)
    }

    fn events(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }
}

/// Extract the useful identifier string from a peripheral ID.
///
/// On macOS peripheral IDs are CoreBluetooth UUIDs; elsewhere they wrap the
/// Bluetooth address.
fn peripheral_id_string(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Choose the stable identifier for a peripheral.
///
/// macOS reports an all-zero address and the peripheral UUID is the only
/// stable handle there; other platforms use the Bluetooth address.
fn identifier(address: &str, id: &PeripheralId) -> String {
    if address == "00:00:00:00:00:00" {
        peripheral_id_string(id)
    } else {
        address.to_string()
    }
}
