/*!
 * Device discovery for CastBridge.
 *
 * [`DiscoveryProvider`] owns the normalized found-service set. It registers
 * itself with a vendor [`DiscoveryAdapter`](crate::adapter::DiscoveryAdapter)
 * and turns the vendor's raw device callbacks into added/removed service
 * events for [`DiscoveryListener`]s. Malformed vendor callbacks (absent
 * device handles, removals for unknown devices) are absorbed and logged,
 * never surfaced or propagated.
 */
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info, warn};

use crate::adapter::{DiscoveryAdapter, DiscoveryCallback, MediaDevice, VendorError};
use crate::command::ServiceCommandError;
use crate::service::MediaService;

/// A service found on the network
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    /// Vendor-supplied stable unique identifier, the identity key
    pub uuid: String,
    /// Human-readable device name, updated in place on rediscovery
    pub friendly_name: String,
    /// Network address. The vendor transport exposes no IP, so this carries
    /// the unique identifier.
    pub address: String,
    /// Identifier of the service type that can drive this device
    pub service_id: String,
    /// Live vendor device handle
    pub device: Option<Arc<dyn MediaDevice>>,
}

/// Receiver of discovery events.
///
/// Every callback carries the emitting provider, so one listener can be
/// registered on several providers and still attribute each event.
pub trait DiscoveryListener: Send + Sync {
    /// A new service was found
    fn on_service_added(&self, provider: &DiscoveryProvider, description: &ServiceDescription);

    /// A previously found service went away
    fn on_service_removed(&self, provider: &DiscoveryProvider, description: &ServiceDescription);

    /// The vendor discovery transport reported a failure. Recoverable; the
    /// found-service set is unaffected.
    fn on_discovery_failed(&self, provider: &DiscoveryProvider, error: ServiceCommandError);
}

struct ProviderInner {
    adapter: Arc<dyn DiscoveryAdapter>,
    service_id: String,
    running: AtomicBool,
    found: Mutex<HashMap<String, ServiceDescription>>,
    listeners: Mutex<Vec<Arc<dyn DiscoveryListener>>>,
    weak_self: Weak<ProviderInner>,
}

impl ProviderInner {
    fn listener_snapshot(&self) -> Vec<Arc<dyn DiscoveryListener>> {
        self.listeners.lock().unwrap().clone()
    }

    /// Rebuild the provider handle for listener callbacks. `None` only while
    /// the provider is being torn down, when no listener can observe it.
    fn provider(&self) -> Option<DiscoveryProvider> {
        self.weak_self
            .upgrade()
            .map(|inner| DiscoveryProvider { inner })
    }
}

/// Normalizing discovery front-end over a vendor discovery adapter.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct DiscoveryProvider {
    inner: Arc<ProviderInner>,
}

impl DiscoveryProvider {
    /// Create a provider that announces found devices as
    /// [`MediaService`](crate::service::MediaService) candidates
    pub fn new(adapter: Arc<dyn DiscoveryAdapter>) -> Self {
        Self::with_service_id(adapter, MediaService::ID)
    }

    /// Create a provider announcing a specific service type
    pub fn with_service_id<S: Into<String>>(adapter: Arc<dyn DiscoveryAdapter>, id: S) -> Self {
        let service_id = id.into();
        Self {
            inner: Arc::new_cyclic(|weak_self| ProviderInner {
                adapter,
                service_id,
                running: AtomicBool::new(false),
                found: Mutex::new(HashMap::new()),
                listeners: Mutex::new(Vec::new()),
                weak_self: weak_self.clone(),
            }),
        }
    }

    /// The service type this provider announces
    pub fn service_id(&self) -> &str {
        &self.inner.service_id
    }

    /// Begin discovery. Idempotent; a second call while running is a no-op.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Discovery already running");
            return;
        }
        info!(service_id = %self.inner.service_id, "Starting discovery");
        self.inner
            .adapter
            .start_discovery(self.callback_handle());
    }

    /// Stop discovery. The vendor transport is only stopped when running,
    /// but every currently found service is always emitted as removed and
    /// the found set cleared.
    pub fn stop(&self) {
        if self.inner.running.swap(false, Ordering::SeqCst) {
            info!("Stopping discovery");
            self.inner.adapter.stop_discovery();
        }

        let removed: Vec<ServiceDescription> = {
            let mut found = self.inner.found.lock().unwrap();
            found.drain().map(|(_, description)| description).collect()
        };
        if removed.is_empty() {
            return;
        }

        let listeners = self.inner.listener_snapshot();
        for description in &removed {
            debug!(uuid = %description.uuid, "Service removed on stop");
            for listener in &listeners {
                listener.on_service_removed(self, description);
            }
        }
    }

    /// Stop and start again, beginning a fresh discovery cycle
    pub fn restart(&self) {
        self.stop();
        self.start();
    }

    /// Force a fresh scan. Equivalent to [`restart`](Self::restart).
    pub fn rescan(&self) {
        self.restart();
    }

    /// Tear discovery down for good. Equivalent to [`stop`](Self::stop).
    pub fn reset(&self) {
        self.stop();
    }

    /// Whether the provider is currently running
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// True when no services have been found (or they were all cleared)
    pub fn is_empty(&self) -> bool {
        self.inner.found.lock().unwrap().is_empty()
    }

    /// Snapshot of the currently found services
    pub fn found_services(&self) -> Vec<ServiceDescription> {
        self.inner.found.lock().unwrap().values().cloned().collect()
    }

    /// Register a discovery listener. The same listener (by identity) is
    /// only registered once.
    pub fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) {
        let mut listeners = self.inner.listeners.lock().unwrap();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Deregister a discovery listener
    pub fn remove_listener(&self, listener: &Arc<dyn DiscoveryListener>) {
        self.inner
            .listeners
            .lock()
            .unwrap()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// The callback handle this provider registers with the vendor adapter
    pub fn callback_handle(&self) -> Arc<dyn DiscoveryCallback> {
        self.inner.clone()
    }
}

/// Two providers are equal when they share state, i.e. they are clones of
/// the same provider.
impl PartialEq for DiscoveryProvider {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DiscoveryProvider {}

impl std::fmt::Debug for DiscoveryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryProvider")
            .field("service_id", &self.inner.service_id)
            .field("running", &self.is_running())
            .finish()
    }
}

impl DiscoveryCallback for ProviderInner {
    fn device_discovered(&self, device: Option<Arc<dyn MediaDevice>>) {
        let device = match device {
            Some(device) => device,
            None => {
                warn!("Discovery reported an absent device handle, ignoring");
                return;
            }
        };

        let uuid = device.unique_identifier();
        let description = {
            let mut found = self.found.lock().unwrap();
            if let Some(existing) = found.get_mut(&uuid) {
                existing.friendly_name = device.name();
                debug!(uuid = %uuid, "Known device re-announced, updated in place");
                return;
            }
            let description = ServiceDescription {
                uuid: uuid.clone(),
                friendly_name: device.name(),
                address: uuid.clone(),
                service_id: self.service_id.clone(),
                device: Some(device),
            };
            found.insert(uuid.clone(), description.clone());
            description
        };

        info!(uuid = %uuid, name = %description.friendly_name, "Service added");
        let provider = match self.provider() {
            Some(provider) => provider,
            None => return,
        };
        for listener in self.listener_snapshot() {
            listener.on_service_added(&provider, &description);
        }
    }

    fn device_lost(&self, device: Option<Arc<dyn MediaDevice>>) {
        let device = match device {
            Some(device) => device,
            None => {
                warn!("Loss reported with an absent device handle, ignoring");
                return;
            }
        };

        let uuid = device.unique_identifier();
        let description = match self.found.lock().unwrap().remove(&uuid) {
            Some(description) => description,
            None => {
                warn!(uuid = %uuid, "Loss reported for an unknown device, ignoring");
                return;
            }
        };

        info!(uuid = %uuid, "Service removed");
        let provider = match self.provider() {
            Some(provider) => provider,
            None => return,
        };
        for listener in self.listener_snapshot() {
            listener.on_service_removed(&provider, &description);
        }
    }

    fn discovery_failure(&self) {
        warn!("Vendor discovery transport failure");
        let error = ServiceCommandError::vendor(
            "Discovery failure",
            VendorError::new("Vendor discovery transport failed"),
        );
        let provider = match self.provider() {
            Some(provider) => provider,
            None => return,
        };
        for listener in self.listener_snapshot() {
            listener.on_discovery_failed(&provider, error.clone());
        }
    }
}
