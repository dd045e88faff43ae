//! Connection lifecycle controller for airlink sensor peripherals.
//!
//! This crate orchestrates BLE device discovery, connection, and
//! notification streaming on top of a host platform that exposes the raw
//! primitives. The controller tracks which devices are known, mid-connection,
//! connected, and subscribed, and reconciles that state against the
//! platform's asynchronous events.
//!
//! # Features
//!
//! - **Discovery loop**: self-rescheduling polling with availability backoff,
//!   cancellable, never terminates on transient error
//! - **Connection management**: duplicate-attempt guard, distinct error
//!   status, reconnect after disconnect or failure
//! - **Notification streams**: toggle with a connection guard, decoded
//!   readings pushed to the presentation layer
//! - **Platform abstraction**: btleplug-backed native implementation plus a
//!   scriptable mock for tests
//! - **Event dispatch**: plain-data broadcast events, no UI coupling
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use airlink_core::{Controller, NativePlatform};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Arc::new(NativePlatform::new().await?);
//!     let controller = Arc::new(Controller::new(Arc::clone(&platform)));
//!
//!     let cancel = CancellationToken::new();
//!     let _pump = controller.start_event_pump(cancel.clone());
//!     let _discovery = controller.start_discovery(cancel.clone());
//!
//!     let mut events = controller.subscribe_events();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!
//!     cancel.cancel();
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod discovery;
pub mod error;
pub mod events;
pub mod mock;
pub mod native;
pub mod registry;
pub mod traits;

// Re-export types and uuid modules from airlink-types for convenience
pub use airlink_types::types;
pub use airlink_types::uuid as uuids;
pub use airlink_types::{ParseError, SensorReading};

// Core exports
pub use controller::{Controller, ControllerConfig};
pub use discovery::DiscoveryOptions;
pub use error::{ConnectionFailureReason, Error, Result};
pub use events::{ControllerEvent, EventDispatcher, EventReceiver, EventSender, LinkStatus};
pub use mock::MockPlatform;
pub use native::NativePlatform;
pub use registry::Registry;
pub use traits::{AdvertisedDevice, CharacteristicHandle, Platform, PlatformEvent};
