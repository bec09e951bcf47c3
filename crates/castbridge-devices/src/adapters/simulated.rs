/*!
 * In-process simulated vendor adapter.
 *
 * [`SimulatedMediaDevice`] keeps a small playback state machine in memory
 * and pushes status changes to registered listeners. Command completions are
 * deferred onto the tokio runtime so callers exercise the same async
 * delivery path a real vendor SDK would use. [`SimulatedDiscoveryAdapter`]
 * announces a fixed set of devices when discovery starts and can be driven
 * manually to simulate devices appearing, disappearing or the transport
 * failing.
 */
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::adapter::{
    AsyncCall, Completion, DeviceHandle, DiscoveryAdapter, DiscoveryCallback, MediaDevice,
    MediaState, MediaStatus, SeekMode, StatusListener, VendorError, VendorMediaInfo, VendorResult,
};

/// An [`AsyncCall`] whose completion runs on a spawned tokio task
struct SpawnedCall<T>(Result<T, VendorError>);

impl<T: Send + 'static> SpawnedCall<T> {
    fn ok(value: T) -> Box<Self> {
        Box::new(SpawnedCall(Ok(value)))
    }
}

impl<T: Send + 'static> AsyncCall<T> for SpawnedCall<T> {
    fn when_done(self: Box<Self>, completion: Completion<T>) {
        tokio::spawn(async move {
            completion(self.0);
        });
    }
}

const DEFAULT_DURATION_MS: i64 = 60_000;

struct Playback {
    media: Option<VendorMediaInfo>,
    state: MediaState,
    position_ms: i64,
    duration_ms: i64,
}

/// A virtual media device living in this process
pub struct SimulatedMediaDevice {
    uid: String,
    name: String,
    playback: Mutex<Playback>,
    listeners: Mutex<Vec<Arc<dyn StatusListener>>>,
}

impl SimulatedMediaDevice {
    /// Create a device with the given identifier and name
    pub fn new<U: Into<String>, N: Into<String>>(uid: U, name: N) -> Arc<Self> {
        Arc::new(Self {
            uid: uid.into(),
            name: name.into(),
            playback: Mutex::new(Playback {
                media: None,
                state: MediaState::NoSource,
                position_ms: 0,
                duration_ms: 0,
            }),
            listeners: Mutex::new(Vec::new()),
        })
    }

    fn transition(&self, state: MediaState) {
        {
            let mut playback = self.playback.lock().unwrap();
            playback.state = state;
        }
        self.notify();
    }

    fn notify(&self) {
        let (status, position_ms) = {
            let playback = self.playback.lock().unwrap();
            (MediaStatus::new(playback.state), playback.position_ms)
        };
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.on_status_change(Some(&status), position_ms);
        }
    }

    fn require_media(&self) -> Result<(), VendorError> {
        if self.playback.lock().unwrap().media.is_none() {
            return Err(VendorError::new("No media source loaded"));
        }
        Ok(())
    }
}

impl fmt::Debug for SimulatedMediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let playback = self.playback.lock().unwrap();
        f.debug_struct("SimulatedMediaDevice")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("state", &playback.state)
            .finish()
    }
}

impl DeviceHandle for SimulatedMediaDevice {
    fn unique_identifier(&self) -> String {
        self.uid.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl MediaDevice for SimulatedMediaDevice {
    fn play(&self) -> VendorResult<()> {
        self.require_media()?;
        debug!(uid = %self.uid, "Simulated play");
        self.transition(MediaState::Playing);
        Ok(SpawnedCall::ok(()))
    }

    fn pause(&self) -> VendorResult<()> {
        self.require_media()?;
        debug!(uid = %self.uid, "Simulated pause");
        self.transition(MediaState::Paused);
        Ok(SpawnedCall::ok(()))
    }

    fn stop(&self) -> VendorResult<()> {
        {
            let mut playback = self.playback.lock().unwrap();
            playback.media = None;
            playback.position_ms = 0;
            playback.duration_ms = 0;
        }
        debug!(uid = %self.uid, "Simulated stop");
        self.transition(MediaState::NoSource);
        Ok(SpawnedCall::ok(()))
    }

    fn seek(&self, mode: SeekMode, position_ms: i64) -> VendorResult<()> {
        self.require_media()?;
        {
            let mut playback = self.playback.lock().unwrap();
            let target = match mode {
                SeekMode::Absolute => position_ms,
                SeekMode::Relative => playback.position_ms + position_ms,
            };
            playback.position_ms = target.clamp(0, playback.duration_ms);
        }
        self.notify();
        Ok(SpawnedCall::ok(()))
    }

    fn duration(&self) -> VendorResult<i64> {
        self.require_media()?;
        Ok(SpawnedCall::ok(self.playback.lock().unwrap().duration_ms))
    }

    fn position(&self) -> VendorResult<i64> {
        self.require_media()?;
        Ok(SpawnedCall::ok(self.playback.lock().unwrap().position_ms))
    }

    fn status(&self) -> VendorResult<MediaStatus> {
        let state = self.playback.lock().unwrap().state;
        Ok(SpawnedCall::ok(MediaStatus::new(state)))
    }

    fn media_info(&self) -> VendorResult<VendorMediaInfo> {
        let media = self
            .playback
            .lock()
            .unwrap()
            .media
            .clone()
            .ok_or_else(|| VendorError::new("No media source loaded"))?;
        Ok(SpawnedCall::ok(media))
    }

    fn set_media_source(
        &self,
        url: Option<&str>,
        metadata: &str,
        autoplay: bool,
        _play_in_background: bool,
    ) -> VendorResult<()> {
        let url = url.ok_or_else(|| VendorError::new("Missing media source url"))?;
        info!(uid = %self.uid, %url, "Simulated media load");
        {
            let mut playback = self.playback.lock().unwrap();
            playback.media = Some(VendorMediaInfo {
                source: url.to_string(),
                metadata: metadata.to_string(),
            });
            playback.position_ms = 0;
            playback.duration_ms = DEFAULT_DURATION_MS;
        }
        self.transition(MediaState::PreparingMedia);
        if autoplay {
            self.transition(MediaState::Playing);
        } else {
            self.transition(MediaState::ReadyToPlay);
        }
        Ok(SpawnedCall::ok(()))
    }

    fn add_status_listener(&self, listener: Arc<dyn StatusListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}

/// Discovery transport announcing in-process simulated devices
pub struct SimulatedDiscoveryAdapter {
    devices: Mutex<Vec<Arc<SimulatedMediaDevice>>>,
    callback: Mutex<Option<Arc<dyn DiscoveryCallback>>>,
}

impl SimulatedDiscoveryAdapter {
    /// Create an adapter with no devices
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
        })
    }

    /// Add a device. When discovery is running it is announced immediately.
    pub fn add_device(&self, device: Arc<SimulatedMediaDevice>) {
        self.devices.lock().unwrap().push(device.clone());
        if let Some(callback) = self.callback.lock().unwrap().clone() {
            callback.device_discovered(Some(device));
        }
    }

    /// Remove a device and report it lost when discovery is running
    pub fn remove_device(&self, uid: &str) {
        let removed = {
            let mut devices = self.devices.lock().unwrap();
            let index = devices.iter().position(|d| d.uid == uid);
            index.map(|index| devices.remove(index))
        };
        if let (Some(device), Some(callback)) = (removed, self.callback.lock().unwrap().clone()) {
            callback.device_lost(Some(device));
        }
    }

    /// Simulate a transport failure
    pub fn fail(&self) {
        if let Some(callback) = self.callback.lock().unwrap().clone() {
            callback.discovery_failure();
        }
    }
}

impl fmt::Debug for SimulatedDiscoveryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedDiscoveryAdapter")
            .field("devices", &self.devices.lock().unwrap().len())
            .finish()
    }
}

impl DiscoveryAdapter for SimulatedDiscoveryAdapter {
    fn start_discovery(&self, callback: Arc<dyn DiscoveryCallback>) {
        info!("Simulated discovery started");
        *self.callback.lock().unwrap() = Some(callback.clone());
        for device in self.devices.lock().unwrap().iter() {
            callback.device_discovered(Some(device.clone()));
        }
    }

    fn stop_discovery(&self) {
        info!("Simulated discovery stopped");
        *self.callback.lock().unwrap() = None;
    }
}
