//! Device lifecycle controller.
//!
//! The controller owns the membership [`Registry`] and drives a [`Platform`]
//! through the connect/disconnect and subscribe/unsubscribe transitions,
//! reconciling registry state against the platform's asynchronous events.
//! Everything the presentation layer needs arrives as [`ControllerEvent`]s;
//! the controller itself has no UI coupling.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use airlink_types::{SensorReading, uuids};

use crate::discovery::{self, DiscoveryOptions};
use crate::error::{Error, Result};
use crate::events::{ControllerEvent, EventDispatcher, EventReceiver, LinkStatus};
use crate::registry::Registry;
use crate::traits::{AdvertisedDevice, CharacteristicHandle, Platform, PlatformEvent};

/// Configuration for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Discovery loop timing.
    pub discovery: DiscoveryOptions,
    /// Event channel capacity.
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryOptions::default(),
            event_capacity: 100,
        }
    }
}

/// Orchestrates the connection lifecycle for sensor peripherals.
///
/// The controller is dependency-injected with its platform and owns all
/// session state; there are no globals. Wrap it in [`Arc`] to run the
/// background tasks ([`start_discovery`](Self::start_discovery),
/// [`start_event_pump`](Self::start_event_pump)) alongside user-driven calls.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use airlink_core::{Controller, MockPlatform};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let platform = Arc::new(MockPlatform::new());
///     let controller = Arc::new(Controller::new(Arc::clone(&platform)));
///     let cancel = CancellationToken::new();
///
///     let pump = controller.start_event_pump(cancel.clone());
///
///     // ... drive connect/toggle from the UI, consume controller.events() ...
///
///     cancel.cancel();
///     let _ = pump.await;
/// }
/// ```
pub struct Controller<P: Platform> {
    platform: Arc<P>,
    registry: Registry,
    events: EventDispatcher,
    config: ControllerConfig,
}

impl<P: Platform + 'static> Controller<P> {
    /// Create a controller with default configuration.
    pub fn new(platform: Arc<P>) -> Self {
        Self::with_config(platform, ControllerConfig::default())
    }

    /// Create a controller with full configuration.
    pub fn with_config(platform: Arc<P>, config: ControllerConfig) -> Self {
        Self {
            platform,
            registry: Registry::new(),
            events: EventDispatcher::new(config.event_capacity),
            config,
        }
    }

    /// The membership registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The event dispatcher for presentation-layer subscriptions.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribe to controller events.
    pub fn subscribe_events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// The controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    // --- Discovery ---

    /// Feed one discovery sighting into the registry and the event stream.
    ///
    /// A new identifier is registered and announced; a repeat sighting only
    /// refreshes the signal-strength indicator.
    pub fn handle_advertisement(&self, device: AdvertisedDevice) {
        if self.registry.mark_known(&device.id) {
            info!(
                "device found: {} ({})",
                device.name.as_deref().unwrap_or("unknown"),
                device.id
            );
            self.events.send(ControllerEvent::DeviceDiscovered {
                id: device.id,
                name: device.name,
                rssi: device.rssi,
            });
        } else {
            self.events.send(ControllerEvent::DeviceSignalUpdated {
                id: device.id,
                rssi: device.rssi,
            });
        }
    }

    /// Start the discovery loop as a background task.
    ///
    /// The loop runs until the token is cancelled; every transient failure is
    /// reported as a diagnostic and the loop continues after a backoff.
    pub fn start_discovery(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(discovery::run(controller, cancel))
    }

    // --- Connection management ---

    /// Connect to a device.
    ///
    /// Rejects with [`Error::AlreadyConnected`] if an attempt is already in
    /// flight or a link is already established, issuing no platform call and
    /// mutating nothing. Otherwise drives the attempt to completion: success
    /// establishes the link, failure surfaces the distinct `Error` status and
    /// leaves the device free for a retry.
    pub async fn connect(&self, id: &str) -> Result<()> {
        // Sole concurrency guard: atomic check-and-set, so a second click or
        // a repeat sighting can never start a second attempt.
        if !self.registry.try_begin_connect(id) {
            debug!("connect rejected, already connected or connecting: {}", id);
            return Err(Error::already_connected(id));
        }

        info!("connecting: {}", id);
        self.set_status(id, LinkStatus::Connecting);

        match self.platform.connect(id).await {
            Ok(()) => {
                // Ends the attempt and establishes the link in one step.
                self.registry.mark_connected(id);
                info!("connected: {}", id);
                self.set_status(id, LinkStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.registry.end_connect(id);
                warn!("connect failed for {}: {}", id, e);
                self.diagnostic(format!("connect failed for {}: {}", id, e));
                self.set_status(id, LinkStatus::Error);
                Err(e)
            }
        }
    }

    /// Trigger a disconnect for a device.
    ///
    /// This only issues the platform call; the state transition happens when
    /// the platform's disconnect event arrives, exactly as it does for link
    /// loss.
    pub async fn disconnect(&self, id: &str) -> Result<()> {
        info!("disconnect requested: {}", id);
        self.platform.disconnect(id).await
    }

    // --- Subscription management ---

    /// Toggle the notification stream for a connected device.
    ///
    /// Returns the new subscription state (`true` = streaming). Rejects with
    /// [`Error::NotConnected`] if the device has no established link, with
    /// zero side effects, so the caller can prompt the user to connect first.
    pub async fn toggle_notifications(&self, id: &str) -> Result<bool> {
        if !self.registry.is_connected(id) {
            self.diagnostic(format!("connect to {} before toggling notifications", id));
            return Err(Error::NotConnected);
        }

        let handle = self.resolve_sensor_characteristic(id).await?;

        if self.registry.is_subscribed(id) {
            self.platform.unsubscribe(&handle).await?;
            self.registry.unsubscribe(id);
            info!("notifications stopped: {}", id);
            self.events.send(ControllerEvent::SubscriptionChanged {
                id: id.to_string(),
                active: false,
            });
            Ok(false)
        } else {
            self.platform.subscribe(&handle).await?;
            if !self.registry.try_subscribe(id) {
                // The link dropped while the subscribe call was in flight;
                // roll the platform back rather than stream to a dead card.
                let _ = self.platform.unsubscribe(&handle).await;
                return Err(Error::NotConnected);
            }
            info!("notifications started: {}", id);
            self.events.send(ControllerEvent::SubscriptionChanged {
                id: id.to_string(),
                active: true,
            });
            Ok(true)
        }
    }

    /// Read the sensor characteristic once and publish the decoded reading.
    ///
    /// Same connection guard as [`toggle_notifications`](Self::toggle_notifications).
    pub async fn refresh(&self, id: &str) -> Result<SensorReading> {
        if !self.registry.is_connected(id) {
            self.diagnostic(format!("connect to {} before refreshing", id));
            return Err(Error::NotConnected);
        }

        let handle = self.resolve_sensor_characteristic(id).await?;
        let value = self.platform.read_value(&handle).await?;
        let reading = SensorReading::from_bytes(&value)?;

        self.events.send(ControllerEvent::ReadingUpdated {
            id: id.to_string(),
            reading,
        });
        Ok(reading)
    }

    async fn resolve_sensor_characteristic(&self, id: &str) -> Result<CharacteristicHandle> {
        self.platform
            .resolve_characteristic(id, uuids::SENSOR_SERVICE, uuids::SENSOR_NOTIFY)
            .await
    }

    // --- Platform event handling ---

    /// Start the platform event pump as a background task.
    ///
    /// The pump is the persistent disconnect/notification observer: it stays
    /// attached for the lifetime of the controller and is idempotent across
    /// reconnects. No error escapes the task.
    pub fn start_event_pump(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut events = self.platform.events();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("event pump cancelled");
                        break;
                    }
                    event = events.recv() => {
                        match event {
                            Ok(event) => controller.handle_platform_event(event),
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                warn!("event pump lagged, {} events dropped", missed);
                                controller.diagnostic(format!(
                                    "platform event pump lagged, {} events dropped",
                                    missed
                                ));
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                debug!("platform event channel closed");
                                break;
                            }
                        }
                    }
                }
            }
        })
    }

    /// Apply one platform event to the registry and the event stream.
    pub fn handle_platform_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Disconnected { id } => {
                info!("disconnected: {}", id);
                // Clears the link and any active subscription; an in-flight
                // attempt resolves on its own.
                self.registry.mark_disconnected(&id);
                self.set_status(&id, LinkStatus::Disconnected);
            }
            PlatformEvent::ValueChanged { id, value } => match SensorReading::from_bytes(&value) {
                Ok(reading) => {
                    self.events.send(ControllerEvent::ReadingUpdated { id, reading });
                }
                Err(e) => {
                    // The previous reading stays on screen; this payload is
                    // dropped.
                    warn!("bad notification payload from {}: {}", id, e);
                    self.diagnostic(format!("bad notification payload from {}: {}", id, e));
                }
            },
        }
    }

    // --- Helpers ---

    fn set_status(&self, id: &str, status: LinkStatus) {
        self.events.send(ControllerEvent::ConnectionStatusChanged {
            id: id.to_string(),
            status,
        });
    }

    /// Emit a fire-and-forget diagnostic event.
    pub fn diagnostic(&self, message: String) {
        self.events.send(ControllerEvent::Diagnostic { message });
    }
}
