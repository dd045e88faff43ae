//! Device discovery loop.
//!
//! Discovery is a cooperative, indefinitely repeating cycle: wait for the
//! platform to be available (backing off while it is not), request visibility
//! of one device, feed the sighting to the controller, then yield briefly
//! before the next cycle. Transient errors are reported and the loop keeps
//! going; the only way to stop it is the cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::controller::Controller;
use crate::traits::Platform;

/// Timing knobs for the discovery loop.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// How long to wait between availability polls while the platform is
    /// unavailable or erroring. Default: 1 second.
    pub availability_backoff: Duration,
    /// How long to yield between successful cycles, so discovery does not
    /// starve other work. Default: 100 ms.
    pub cycle_delay: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            availability_backoff: Duration::from_millis(1000),
            cycle_delay: Duration::from_millis(100),
        }
    }
}

impl DiscoveryOptions {
    /// Create new discovery options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the availability backoff interval.
    #[must_use]
    pub fn availability_backoff(mut self, backoff: Duration) -> Self {
        self.availability_backoff = backoff;
        self
    }

    /// Set the delay between cycles.
    #[must_use]
    pub fn cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }
}

/// Run discovery cycles until cancelled.
///
/// Never returns an error: every failure inside a cycle is converted into a
/// diagnostic event and the loop continues after the backoff.
pub(crate) async fn run<P: Platform + 'static>(
    controller: Arc<Controller<P>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("discovery loop cancelled");
                break;
            }
            _ = cycle(&controller) => {}
        }
    }
}

/// One discovery cycle: availability gate, one device request, yield.
async fn cycle<P: Platform + 'static>(controller: &Controller<P>) {
    let options = controller.config().discovery.clone();

    wait_until_available(controller, options.availability_backoff).await;

    match controller.platform().request_device().await {
        Ok(device) => controller.handle_advertisement(device),
        Err(e) => {
            warn!("discovery request failed: {}", e);
            controller.diagnostic(format!("discovery request failed: {}", e));
            sleep(options.availability_backoff).await;
            return;
        }
    }

    // Re-check availability before scheduling the next request, as the
    // platform may have gone away while the request was in flight.
    wait_until_available(controller, options.availability_backoff).await;
    sleep(options.cycle_delay).await;
}

/// Poll availability until the platform reports usable, backing off between
/// polls. Errors count as unavailable; this sub-loop never gives up.
async fn wait_until_available<P: Platform + 'static>(controller: &Controller<P>, backoff: Duration) {
    loop {
        match controller.platform().availability().await {
            Ok(true) => return,
            Ok(false) => {
                controller.diagnostic("Bluetooth unavailable, waiting".to_string());
            }
            Err(e) => {
                warn!("availability check failed: {}", e);
                controller.diagnostic(format!("availability check failed: {}", e));
            }
        }
        sleep(backoff).await;
    }
}
