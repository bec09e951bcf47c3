/*!
 * Device services and capability trait surfaces.
 *
 * [`DeviceService`] is the common contract every service exposes to the
 * registry: identity, capability advertisement, priority declaration and
 * connection lifecycle. [`MediaPlayer`] and [`MediaControl`] are the
 * capability surfaces callers route commands through. [`MediaService`] is the
 * concrete service driving a vendor media device.
 */
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info, warn};

use crate::adapter::{MediaDevice, SeekMode};
use crate::capability::{caps, CapabilityInterface, CapabilityPriority, DiscoveryFilter};
use crate::command::{dispatch, notify_error, notify_not_supported, Listener, ServiceCommandError};
use crate::discovery::ServiceDescription;
use crate::media::{
    build_metadata_envelope, parse_vendor_media_info, LaunchSession, MediaInfo, MediaLaunchObject,
};
use crate::subscription::{PlayStateStatus, PlayStateSubscription};

/// Receiver of service connection lifecycle events
pub trait ServiceListener: Send + Sync {
    /// The service connected to its device
    fn on_connect_success(&self);

    /// The service could not connect
    fn on_connect_failure(&self, error: ServiceCommandError);

    /// The service disconnected
    fn on_disconnect(&self);
}

/// Common contract between services and the capability registry
pub trait DeviceService: Send + Sync {
    /// Service type identifier
    fn service_id(&self) -> &str;

    /// Description of the discovered device this service is bound to
    fn description(&self) -> Option<ServiceDescription>;

    /// Fine-grained capability ids this service advertises
    fn capabilities(&self) -> HashSet<String>;

    /// Priority this service declares for a capability interface.
    ///
    /// Pure and total: an absent or unknown interface yields
    /// [`CapabilityPriority::NotSupported`], never an error.
    fn priority_for(&self, interface: Option<CapabilityInterface>) -> CapabilityPriority;

    /// Connect to the bound device
    fn connect(&self);

    /// Disconnect and release device-side resources
    fn disconnect(&self);

    /// Whether the service is currently connected
    fn is_connected(&self) -> bool;

    /// Whether the service can be connected at all
    fn is_connectable(&self) -> bool;

    /// Set the connection lifecycle listener
    fn set_listener(&self, listener: Option<Arc<dyn ServiceListener>>);
}

/// Media launch and metadata capability surface
pub trait MediaPlayer: Send + Sync {
    /// Display a still image
    fn display_image(&self, media: &MediaInfo, listener: Option<Listener<MediaLaunchObject>>);

    /// Launch audio/video playback
    fn play_media(
        &self,
        media: &MediaInfo,
        should_loop: bool,
        listener: Option<Listener<MediaLaunchObject>>,
    );

    /// Query information about the loaded media
    fn get_media_info(&self, listener: Option<Listener<MediaInfo>>);

    /// Subscribe to media info changes
    fn subscribe_media_info(&self, listener: Option<Listener<MediaInfo>>);

    /// Close launched media
    fn close_media(&self, listener: Option<Listener<()>>);
}

/// Transport control capability surface
pub trait MediaControl: Send + Sync {
    /// Resume or start playback
    fn play(&self, listener: Option<Listener<()>>);

    /// Pause playback
    fn pause(&self, listener: Option<Listener<()>>);

    /// Stop playback
    fn stop_playback(&self, listener: Option<Listener<()>>);

    /// Seek to an absolute position in milliseconds
    fn seek(&self, position_ms: i64, listener: Option<Listener<()>>);

    /// Jump backwards
    fn rewind(&self, listener: Option<Listener<()>>);

    /// Jump forwards
    fn fast_forward(&self, listener: Option<Listener<()>>);

    /// Go to the previous playlist entry
    fn previous(&self, listener: Option<Listener<()>>);

    /// Go to the next playlist entry
    fn next(&self, listener: Option<Listener<()>>);

    /// Query the media duration in milliseconds
    fn get_duration(&self, listener: Option<Listener<i64>>);

    /// Query the playback position in milliseconds
    fn get_position(&self, listener: Option<Listener<i64>>);

    /// Query the current play state
    fn get_play_state(&self, listener: Option<Listener<PlayStateStatus>>);

    /// Subscribe to play state changes.
    ///
    /// Returns the live subscription, or `None` when no device is bound.
    fn subscribe_play_state(
        &self,
        listener: Option<Listener<PlayStateStatus>>,
    ) -> Option<Arc<PlayStateSubscription>>;
}

/// Service driving a vendor media device.
///
/// Implements [`MediaPlayer`] and [`MediaControl`] with
/// [`CapabilityPriority::High`]; every other interface is not supported.
pub struct MediaService {
    device: Mutex<Option<Arc<dyn MediaDevice>>>,
    description: Mutex<Option<ServiceDescription>>,
    listener: Mutex<Option<Arc<dyn ServiceListener>>>,
    connected: AtomicBool,
    subscription: Mutex<Option<Arc<PlayStateSubscription>>>,
    weak_self: Weak<MediaService>,
}

impl MediaService {
    /// Service type identifier
    pub const ID: &'static str = "MediaService";

    /// Create a service bound to an optional device handle
    pub fn new(device: Option<Arc<dyn MediaDevice>>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            device: Mutex::new(device),
            description: Mutex::new(None),
            listener: Mutex::new(None),
            connected: AtomicBool::new(false),
            subscription: Mutex::new(None),
            weak_self: weak.clone(),
        })
    }

    /// Create a service from a discovered service description
    pub fn from_description(description: ServiceDescription) -> Arc<Self> {
        let device = description.device.clone();
        Arc::new_cyclic(|weak| Self {
            device: Mutex::new(device),
            description: Mutex::new(Some(description)),
            listener: Mutex::new(None),
            connected: AtomicBool::new(false),
            subscription: Mutex::new(None),
            weak_self: weak.clone(),
        })
    }

    /// The discovery filter matching devices this service can drive
    pub fn discovery_filter() -> DiscoveryFilter {
        DiscoveryFilter::new(Self::ID, Self::ID)
    }

    /// Bind or unbind the vendor device handle
    pub fn set_device(&self, device: Option<Arc<dyn MediaDevice>>) {
        *self.device.lock().unwrap() = device;
    }

    /// Update the service description
    pub fn set_description(&self, description: Option<ServiceDescription>) {
        *self.description.lock().unwrap() = description;
    }

    fn device(&self) -> Option<Arc<dyn MediaDevice>> {
        self.device.lock().unwrap().clone()
    }

    fn service_listener(&self) -> Option<Arc<dyn ServiceListener>> {
        self.listener.lock().unwrap().clone()
    }

    /// Build the envelope, hand the source to the device and deliver a
    /// launch object on success
    fn launch_media(&self, media: &MediaInfo, listener: Option<Listener<MediaLaunchObject>>) {
        let envelope = build_metadata_envelope(media).to_string();
        let url = media.url.clone();
        let weak = self.weak_self.clone();
        dispatch(
            self.device().as_ref(),
            "Error setting media source",
            listener,
            |device| device.set_media_source(url.as_deref(), &envelope, true, false),
            move |()| {
                let media_control = weak
                    .upgrade()
                    .map(|service| service as Arc<dyn MediaControl>);
                Ok(MediaLaunchObject {
                    launch_session: LaunchSession::media(MediaService::ID),
                    media_control,
                })
            },
        );
    }
}

impl std::fmt::Debug for MediaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaService")
            .field("connected", &self.is_connected())
            .field("device", &self.device())
            .finish()
    }
}

impl DeviceService for MediaService {
    fn service_id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> Option<ServiceDescription> {
        self.description.lock().unwrap().clone()
    }

    fn capabilities(&self) -> HashSet<String> {
        [
            caps::MEDIA_INFO_GET,
            caps::DISPLAY_IMAGE,
            caps::PLAY_AUDIO,
            caps::PLAY_VIDEO,
            caps::CLOSE,
            caps::META_MIME_TYPE,
            caps::META_THUMBNAIL,
            caps::META_TITLE,
            caps::SUBTITLE_WEBVTT,
            caps::PLAY,
            caps::PAUSE,
            caps::STOP,
            caps::SEEK,
            caps::DURATION,
            caps::POSITION,
            caps::PLAY_STATE,
            caps::PLAY_STATE_SUBSCRIBE,
        ]
        .iter()
        .map(|id| id.to_string())
        .collect()
    }

    fn priority_for(&self, interface: Option<CapabilityInterface>) -> CapabilityPriority {
        match interface {
            Some(CapabilityInterface::MediaPlayer) | Some(CapabilityInterface::MediaControl) => {
                CapabilityPriority::High
            }
            _ => CapabilityPriority::NotSupported,
        }
    }

    fn connect(&self) {
        if self.device().is_none() {
            warn!("Connect rejected, no device handle bound");
            if let Some(listener) = self.service_listener() {
                listener.on_connect_failure(ServiceCommandError::NotConnected);
            }
            return;
        }
        self.connected.store(true, Ordering::SeqCst);
        info!("Media service connected");
        if let Some(listener) = self.service_listener() {
            listener.on_connect_success();
        }
    }

    fn disconnect(&self) {
        let subscription = self.subscription.lock().unwrap().take();
        if let Some(subscription) = subscription {
            debug!("Tearing down play state subscription");
            subscription.unsubscribe();
        }
        self.connected.store(false, Ordering::SeqCst);
        info!("Media service disconnected");
        if let Some(listener) = self.service_listener() {
            listener.on_disconnect();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_connectable(&self) -> bool {
        true
    }

    fn set_listener(&self, listener: Option<Arc<dyn ServiceListener>>) {
        *self.listener.lock().unwrap() = listener;
    }
}

impl MediaPlayer for MediaService {
    fn display_image(&self, media: &MediaInfo, listener: Option<Listener<MediaLaunchObject>>) {
        self.launch_media(media, listener);
    }

    fn play_media(
        &self,
        media: &MediaInfo,
        _should_loop: bool,
        listener: Option<Listener<MediaLaunchObject>>,
    ) {
        // The vendor transport cannot loop; the envelope always carries
        // noreplay = true.
        self.launch_media(media, listener);
    }

    fn get_media_info(&self, listener: Option<Listener<MediaInfo>>) {
        dispatch(
            self.device().as_ref(),
            "Error getting media info",
            listener,
            |device| device.media_info(),
            |info| parse_vendor_media_info(&info),
        );
    }

    fn subscribe_media_info(&self, listener: Option<Listener<MediaInfo>>) {
        notify_not_supported(&listener);
    }

    fn close_media(&self, listener: Option<Listener<()>>) {
        dispatch(
            self.device().as_ref(),
            "Error stopping",
            listener,
            |device| device.stop(),
            Ok,
        );
    }
}

impl MediaControl for MediaService {
    fn play(&self, listener: Option<Listener<()>>) {
        dispatch(
            self.device().as_ref(),
            "Error playing",
            listener,
            |device| device.play(),
            Ok,
        );
    }

    fn pause(&self, listener: Option<Listener<()>>) {
        dispatch(
            self.device().as_ref(),
            "Error pausing",
            listener,
            |device| device.pause(),
            Ok,
        );
    }

    fn stop_playback(&self, listener: Option<Listener<()>>) {
        dispatch(
            self.device().as_ref(),
            "Error stopping",
            listener,
            |device| device.stop(),
            Ok,
        );
    }

    fn seek(&self, position_ms: i64, listener: Option<Listener<()>>) {
        dispatch(
            self.device().as_ref(),
            "Error seeking",
            listener,
            |device| device.seek(SeekMode::Absolute, position_ms),
            Ok,
        );
    }

    fn rewind(&self, listener: Option<Listener<()>>) {
        notify_not_supported(&listener);
    }

    fn fast_forward(&self, listener: Option<Listener<()>>) {
        notify_not_supported(&listener);
    }

    fn previous(&self, listener: Option<Listener<()>>) {
        notify_not_supported(&listener);
    }

    fn next(&self, listener: Option<Listener<()>>) {
        notify_not_supported(&listener);
    }

    fn get_duration(&self, listener: Option<Listener<i64>>) {
        dispatch(
            self.device().as_ref(),
            "Error getting duration",
            listener,
            |device| device.duration(),
            Ok,
        );
    }

    fn get_position(&self, listener: Option<Listener<i64>>) {
        dispatch(
            self.device().as_ref(),
            "Error getting position",
            listener,
            |device| device.position(),
            Ok,
        );
    }

    fn get_play_state(&self, listener: Option<Listener<PlayStateStatus>>) {
        dispatch(
            self.device().as_ref(),
            "Error getting play state",
            listener,
            |device| device.status(),
            |status| Ok(PlayStateStatus::from(status.state)),
        );
    }

    fn subscribe_play_state(
        &self,
        listener: Option<Listener<PlayStateStatus>>,
    ) -> Option<Arc<PlayStateSubscription>> {
        let device = match self.device() {
            Some(device) => device,
            None => {
                notify_error(&listener, ServiceCommandError::NotConnected);
                return None;
            }
        };

        let subscription = {
            let mut guard = self.subscription.lock().unwrap();
            match guard.as_ref().filter(|s| s.is_active()) {
                Some(existing) => existing.clone(),
                None => {
                    debug!("Registering vendor status listener");
                    let subscription = PlayStateSubscription::new(device.clone());
                    device.add_status_listener(subscription.clone());
                    *guard = Some(subscription.clone());
                    subscription
                }
            }
        };

        if let Some(listener) = listener {
            subscription.add_listener(listener.clone());
            // Push the current state so a fresh subscriber does not have to
            // wait for the next vendor status change.
            self.get_play_state(Some(listener));
        }
        Some(subscription)
    }
}
