/*!
 * Capability model and service registry.
 *
 * Services declare a [`CapabilityPriority`] per [`CapabilityInterface`] and a
 * set of fine-grained capability id strings (the [`caps`] constants). The
 * [`CapabilityRegistry`] collects registered services in registration order
 * and resolves, per interface, the best service to route commands through.
 */
use std::sync::{Arc, Mutex};

use castbridge_core::config::DiscoveryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::service::DeviceService;

/// How well a service implements a capability interface.
///
/// Total order: `NotSupported < Normal < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityPriority {
    /// The interface is not implemented at all
    NotSupported,
    /// A working implementation
    Normal,
    /// The preferred implementation when several services offer the interface
    High,
}

/// Coarse capability interfaces a service may implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityInterface {
    /// Media launch and metadata
    MediaPlayer,
    /// Transport control of playing media
    MediaControl,
    /// Volume and mute
    VolumeControl,
    /// Remote key injection
    KeyControl,
    /// Application launching
    Launcher,
    /// Pointer control
    MouseControl,
    /// Playlist navigation
    PlaylistControl,
    /// Power on/off
    PowerControl,
    /// Text entry
    TextInputControl,
    /// On-screen notifications
    ToastControl,
    /// Channel and tuner control
    TvControl,
    /// Web application launching
    WebAppLauncher,
    /// External input selection
    ExternalInputControl,
}

/// Fine-grained capability id strings advertised by services
pub mod caps {
    /// Query information about the loaded media
    pub const MEDIA_INFO_GET: &str = "MediaPlayer.MediaInfo.Get";
    /// Display a still image
    pub const DISPLAY_IMAGE: &str = "MediaPlayer.Display.Image";
    /// Play audio media
    pub const PLAY_AUDIO: &str = "MediaPlayer.Play.Audio";
    /// Play video media
    pub const PLAY_VIDEO: &str = "MediaPlayer.Play.Video";
    /// Close launched media
    pub const CLOSE: &str = "MediaPlayer.Close";
    /// Media MIME type in launch metadata
    pub const META_MIME_TYPE: &str = "MediaPlayer.MetaData.MimeType";
    /// Thumbnail artwork in launch metadata
    pub const META_THUMBNAIL: &str = "MediaPlayer.MetaData.Thumbnail";
    /// Title in launch metadata
    pub const META_TITLE: &str = "MediaPlayer.MetaData.Title";
    /// WebVTT subtitle tracks
    pub const SUBTITLE_WEBVTT: &str = "MediaPlayer.Subtitle.WebVTT";
    /// Resume playback
    pub const PLAY: &str = "MediaControl.Play";
    /// Pause playback
    pub const PAUSE: &str = "MediaControl.Pause";
    /// Stop playback
    pub const STOP: &str = "MediaControl.Stop";
    /// Seek to a position
    pub const SEEK: &str = "MediaControl.Seek";
    /// Query media duration
    pub const DURATION: &str = "MediaControl.Duration";
    /// Query playback position
    pub const POSITION: &str = "MediaControl.Position";
    /// Query the current play state
    pub const PLAY_STATE: &str = "MediaControl.PlayState";
    /// Subscribe to play state changes
    pub const PLAY_STATE_SUBSCRIBE: &str = "MediaControl.PlayState.Subscribe";
}

/// Pairing of a service type with the discovery filter it matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    /// Service type identifier
    pub service_id: String,
    /// Filter string handed to the discovery layer
    pub service_filter: String,
}

impl DiscoveryFilter {
    /// Create a filter
    pub fn new<I: Into<String>, F: Into<String>>(service_id: I, service_filter: F) -> Self {
        Self {
            service_id: service_id.into(),
            service_filter: service_filter.into(),
        }
    }
}

/// Event emitted when the registry contents change
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A service was registered
    ServiceRegistered {
        /// Device uuid the service is bound to (empty when unbound)
        uuid: String,
        /// Service type identifier
        service_id: String,
        /// When the registration happened
        timestamp: DateTime<Utc>,
    },
    /// A service was removed
    ServiceRemoved {
        /// Device uuid the service was bound to
        uuid: String,
        /// Service type identifier
        service_id: String,
        /// When the removal happened
        timestamp: DateTime<Utc>,
    },
}

fn service_uuid(service: &Arc<dyn DeviceService>) -> String {
    service
        .description()
        .map(|description| description.uuid)
        .unwrap_or_default()
}

/// Registry of live services with per-interface priority resolution.
///
/// Services are kept in registration order; [`best_for`](Self::best_for)
/// breaks priority ties in favor of the earliest registration, so routing is
/// deterministic across runs.
pub struct CapabilityRegistry {
    services: Mutex<Vec<Arc<dyn DeviceService>>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl CapabilityRegistry {
    /// Create an empty registry with the given event channel capacity
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            services: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Create a registry sized from the discovery configuration
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.event_channel_capacity)
    }

    /// Subscribe to registry change events
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Register a service. Returns false when a service with the same type
    /// and device uuid is already present.
    pub fn register(&self, service: Arc<dyn DeviceService>) -> bool {
        let uuid = service_uuid(&service);
        let service_id = service.service_id().to_string();

        {
            let mut services = self.services.lock().unwrap();
            let duplicate = services
                .iter()
                .any(|s| s.service_id() == service_id && service_uuid(s) == uuid);
            if duplicate {
                debug!(%uuid, %service_id, "Service already registered");
                return false;
            }
            services.push(service);
        }

        info!(%uuid, %service_id, "Service registered");
        let _ = self.events.send(RegistryEvent::ServiceRegistered {
            uuid,
            service_id,
            timestamp: Utc::now(),
        });
        true
    }

    /// Remove the service bound to the given device uuid
    pub fn unregister(&self, uuid: &str) -> Option<Arc<dyn DeviceService>> {
        let removed = {
            let mut services = self.services.lock().unwrap();
            let index = services.iter().position(|s| service_uuid(s) == uuid)?;
            services.remove(index)
        };

        info!(%uuid, "Service removed");
        let _ = self.events.send(RegistryEvent::ServiceRemoved {
            uuid: uuid.to_string(),
            service_id: removed.service_id().to_string(),
            timestamp: Utc::now(),
        });
        Some(removed)
    }

    /// Pick the service with the highest priority for the interface.
    ///
    /// Returns `None` when no registered service supports it. Equal
    /// priorities resolve to the first-registered service.
    pub fn best_for(&self, interface: CapabilityInterface) -> Option<Arc<dyn DeviceService>> {
        let services = self.services.lock().unwrap();
        let mut best: Option<(&Arc<dyn DeviceService>, CapabilityPriority)> = None;
        for service in services.iter() {
            let priority = service.priority_for(Some(interface));
            if priority == CapabilityPriority::NotSupported {
                continue;
            }
            let better = match best {
                Some((_, current)) => priority > current,
                None => true,
            };
            if better {
                best = Some((service, priority));
            }
        }
        best.map(|(service, _)| service.clone())
    }

    /// Snapshot of registered services, in registration order
    pub fn services(&self) -> Vec<Arc<dyn DeviceService>> {
        self.services.lock().unwrap().clone()
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.lock().unwrap().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.services.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("services", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::discovery::ServiceDescription;
    use crate::service::ServiceListener;

    struct StubService {
        service_id: String,
        uuid: String,
        media_control: CapabilityPriority,
    }

    impl StubService {
        fn new(service_id: &str, uuid: &str, media_control: CapabilityPriority) -> Arc<Self> {
            Arc::new(Self {
                service_id: service_id.to_string(),
                uuid: uuid.to_string(),
                media_control,
            })
        }
    }

    impl DeviceService for StubService {
        fn service_id(&self) -> &str {
            &self.service_id
        }

        fn description(&self) -> Option<ServiceDescription> {
            Some(ServiceDescription {
                uuid: self.uuid.clone(),
                friendly_name: "stub".to_string(),
                address: self.uuid.clone(),
                service_id: self.service_id.clone(),
                device: None,
            })
        }

        fn capabilities(&self) -> HashSet<String> {
            HashSet::new()
        }

        fn priority_for(&self, interface: Option<CapabilityInterface>) -> CapabilityPriority {
            match interface {
                Some(CapabilityInterface::MediaControl) => self.media_control,
                _ => CapabilityPriority::NotSupported,
            }
        }

        fn connect(&self) {}

        fn disconnect(&self) {}

        fn is_connected(&self) -> bool {
            false
        }

        fn is_connectable(&self) -> bool {
            true
        }

        fn set_listener(&self, _listener: Option<Arc<dyn ServiceListener>>) {}
    }

    #[test]
    fn test_priority_total_order() {
        assert!(CapabilityPriority::NotSupported < CapabilityPriority::Normal);
        assert!(CapabilityPriority::Normal < CapabilityPriority::High);
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let registry = CapabilityRegistry::new(16);
        let service = StubService::new("MediaService", "UID", CapabilityPriority::High);
        assert!(registry.register(service.clone()));
        assert!(!registry.register(service));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_removes_by_uuid() {
        let registry = CapabilityRegistry::new(16);
        registry.register(StubService::new(
            "MediaService",
            "UID",
            CapabilityPriority::High,
        ));
        assert!(registry.unregister("UID").is_some());
        assert!(registry.unregister("UID").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_best_for_prefers_higher_priority() {
        let registry = CapabilityRegistry::new(16);
        registry.register(StubService::new(
            "DialService",
            "A",
            CapabilityPriority::Normal,
        ));
        registry.register(StubService::new(
            "MediaService",
            "B",
            CapabilityPriority::High,
        ));

        let best = registry.best_for(CapabilityInterface::MediaControl).unwrap();
        assert_eq!(best.service_id(), "MediaService");
    }

    #[test]
    fn test_best_for_ties_break_to_first_registered() {
        let registry = CapabilityRegistry::new(16);
        registry.register(StubService::new(
            "FirstService",
            "A",
            CapabilityPriority::High,
        ));
        registry.register(StubService::new(
            "SecondService",
            "B",
            CapabilityPriority::High,
        ));

        let best = registry.best_for(CapabilityInterface::MediaControl).unwrap();
        assert_eq!(best.service_id(), "FirstService");
    }

    #[test]
    fn test_best_for_skips_not_supported() {
        let registry = CapabilityRegistry::new(16);
        registry.register(StubService::new(
            "MediaService",
            "A",
            CapabilityPriority::NotSupported,
        ));
        assert!(registry.best_for(CapabilityInterface::MediaControl).is_none());
        assert!(registry.best_for(CapabilityInterface::VolumeControl).is_none());
    }

    #[tokio::test]
    async fn test_registry_events() {
        let registry = CapabilityRegistry::new(16);
        let mut events = registry.subscribe();

        registry.register(StubService::new(
            "MediaService",
            "UID",
            CapabilityPriority::High,
        ));
        registry.unregister("UID");

        match events.recv().await.unwrap() {
            RegistryEvent::ServiceRegistered {
                uuid, service_id, ..
            } => {
                assert_eq!(uuid, "UID");
                assert_eq!(service_id, "MediaService");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match events.recv().await.unwrap() {
            RegistryEvent::ServiceRemoved { uuid, .. } => assert_eq!(uuid, "UID"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
