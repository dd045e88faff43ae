//! Membership registry for the device connection lifecycle.
//!
//! The registry tracks four sets of device identifiers: every device seen
//! this session, devices with an in-flight connection attempt, devices with
//! an established link, and devices with an active notification stream.
//!
//! All operations take the internal lock once and perform the full
//! check-and-mutate sequence under it, with no await point inside. That makes
//! each operation atomic with respect to the cooperative interleaving of the
//! async tasks that share the registry, which is the sole concurrency guard
//! against duplicate connection attempts from repeated clicks or repeated
//! discovery sightings.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Sets {
    known: HashSet<String>,
    connecting: HashSet<String>,
    connected: HashSet<String>,
    subscribed: HashSet<String>,
}

/// Tracks which devices are known, mid-connection, connected, and subscribed.
///
/// Invariants upheld by construction:
/// - a device is never in `connecting` and `connected` at the same time
/// - a subscribed device is always connected (a disconnect clears both)
/// - a connected device is always known
/// - `connecting` membership is removed exactly once per attempt, on either
///   success ([`mark_connected`](Self::mark_connected)) or failure
///   ([`end_connect`](Self::end_connect))
#[derive(Debug, Default)]
pub struct Registry {
    sets: Mutex<Sets>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Sets> {
        // No await ever happens under this lock, so a poisoned mutex can only
        // come from a panic mid-mutation; propagate it.
        self.sets.lock().expect("registry mutex poisoned")
    }

    /// Record a discovered device. Returns `true` if the identifier was new.
    pub fn mark_known(&self, id: &str) -> bool {
        self.lock().known.insert(id.to_string())
    }

    /// Begin a connection attempt for `id`.
    ///
    /// Succeeds only if `id` is in neither `connecting` nor `connected`;
    /// otherwise returns `false` and performs no mutation.
    pub fn try_begin_connect(&self, id: &str) -> bool {
        let mut sets = self.lock();
        if sets.connecting.contains(id) || sets.connected.contains(id) {
            return false;
        }
        sets.connecting.insert(id.to_string());
        true
    }

    /// End a connection attempt without establishing a link (the failure path).
    pub fn end_connect(&self, id: &str) {
        self.lock().connecting.remove(id);
    }

    /// Record an established link (the success path of an attempt).
    ///
    /// Removes `id` from `connecting` and inserts it into `connected` under
    /// one lock, so no observer can see the device in both sets or see the
    /// attempt end before the link exists.
    pub fn mark_connected(&self, id: &str) {
        let mut sets = self.lock();
        sets.connecting.remove(id);
        sets.connected.insert(id.to_string());
        sets.known.insert(id.to_string());
    }

    /// Record a lost or closed link.
    ///
    /// Clears `connected` and `subscribed` membership regardless of prior
    /// subscription state. An attempt currently in `connecting` is left
    /// alone; its own resolution removes it.
    pub fn mark_disconnected(&self, id: &str) {
        let mut sets = self.lock();
        sets.connected.remove(id);
        sets.subscribed.remove(id);
    }

    /// Begin a notification subscription for `id`.
    ///
    /// Succeeds only if `id` is connected; otherwise returns `false` with
    /// zero mutation so the caller can surface a "connect first" prompt.
    pub fn try_subscribe(&self, id: &str) -> bool {
        let mut sets = self.lock();
        if !sets.connected.contains(id) {
            return false;
        }
        sets.subscribed.insert(id.to_string());
        true
    }

    /// End a notification subscription.
    pub fn unsubscribe(&self, id: &str) {
        self.lock().subscribed.remove(id);
    }

    // --- Membership queries ---

    /// Whether the device has been discovered this session.
    pub fn is_known(&self, id: &str) -> bool {
        self.lock().known.contains(id)
    }

    /// Whether a connection attempt is in flight for the device.
    pub fn is_connecting(&self, id: &str) -> bool {
        self.lock().connecting.contains(id)
    }

    /// Whether the device has an established link.
    pub fn is_connected(&self, id: &str) -> bool {
        self.lock().connected.contains(id)
    }

    /// Whether the device has an active notification stream.
    pub fn is_subscribed(&self, id: &str) -> bool {
        self.lock().subscribed.contains(id)
    }

    /// Number of devices discovered this session.
    pub fn known_count(&self) -> usize {
        self.lock().known.len()
    }

    /// Number of devices with an established link.
    pub fn connected_count(&self) -> usize {
        self.lock().connected.len()
    }

    /// Snapshot of the identifiers with an established link.
    pub fn connected_ids(&self) -> Vec<String> {
        self.lock().connected.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_connect_rejects_duplicates() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        // A second attempt while the first is in flight must fail without
        // touching any set.
        assert!(!registry.try_begin_connect("dev-1"));
        assert!(registry.is_connecting("dev-1"));
        assert!(!registry.is_connected("dev-1"));
    }

    #[test]
    fn test_begin_connect_rejects_connected_device() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");

        assert!(!registry.try_begin_connect("dev-1"));
    }

    #[test]
    fn test_connecting_and_connected_are_disjoint() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        assert!(registry.is_connecting("dev-1") && !registry.is_connected("dev-1"));

        registry.mark_connected("dev-1");
        assert!(!registry.is_connecting("dev-1") && registry.is_connected("dev-1"));
    }

    #[test]
    fn test_end_connect_clears_attempt() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.end_connect("dev-1");

        assert!(!registry.is_connecting("dev-1"));
        // A retry after failure is a fresh attempt.
        assert!(registry.try_begin_connect("dev-1"));
    }

    #[test]
    fn test_connected_implies_known() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");

        assert!(registry.is_known("dev-1"));
    }

    #[test]
    fn test_subscribe_requires_connected() {
        let registry = Registry::new();

        assert!(!registry.try_subscribe("dev-1"));
        assert!(!registry.is_subscribed("dev-1"));

        registry.mark_known("dev-1");
        assert!(!registry.try_subscribe("dev-1"));
        assert!(!registry.is_subscribed("dev-1"));

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");
        assert!(registry.try_subscribe("dev-1"));
        assert!(registry.is_subscribed("dev-1"));
    }

    #[test]
    fn test_disconnect_clears_subscription() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");
        assert!(registry.try_subscribe("dev-1"));

        registry.mark_disconnected("dev-1");

        assert!(!registry.is_connected("dev-1"));
        assert!(!registry.is_subscribed("dev-1"));
        // Still known; discovery state survives link loss.
        assert!(registry.is_known("dev-1"));
    }

    #[test]
    fn test_disconnect_leaves_inflight_attempt_alone() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_disconnected("dev-1");

        assert!(registry.is_connecting("dev-1"));
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");
        registry.mark_disconnected("dev-1");

        assert!(registry.try_begin_connect("dev-1"));
    }

    #[test]
    fn test_mark_known_reports_new_identifiers() {
        let registry = Registry::new();

        assert!(registry.mark_known("dev-1"));
        assert!(!registry.mark_known("dev-1"));
        assert!(registry.mark_known("dev-2"));
        assert_eq!(registry.known_count(), 2);
    }

    #[test]
    fn test_unsubscribe_toggles_back() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");

        assert!(registry.try_subscribe("dev-1"));
        registry.unsubscribe("dev-1");
        assert!(!registry.is_subscribed("dev-1"));
        // Device is still connected after the stream stops.
        assert!(registry.is_connected("dev-1"));
    }

    #[test]
    fn test_connected_ids_snapshot() {
        let registry = Registry::new();

        assert!(registry.try_begin_connect("dev-1"));
        registry.mark_connected("dev-1");
        assert!(registry.try_begin_connect("dev-2"));
        registry.mark_connected("dev-2");

        let mut ids = registry.connected_ids();
        ids.sort();
        assert_eq!(ids, vec!["dev-1".to_string(), "dev-2".to_string()]);
        assert_eq!(registry.connected_count(), 2);
    }
}
