/*!
 * Shared test doubles for the devices crate.
 *
 * [`MockMediaDevice`] scripts each vendor primitive to succeed, fail
 * synchronously, or fail on async resolution, and records every call.
 * [`MockDiscoveryAdapter`] counts start/stop invocations and exposes the
 * callback handed to it. Recording listeners capture everything delivered
 * to them for later assertions.
 */
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapter::{
    DeviceHandle, DiscoveryAdapter, DiscoveryCallback, MediaDevice, MediaState, MediaStatus,
    ReadyCall, SeekMode, StatusListener, VendorError, VendorMediaInfo, VendorResult,
};
use crate::command::{ResponseListener, ServiceCommandError};
use crate::discovery::{DiscoveryListener, DiscoveryProvider, ServiceDescription};

/// Scripted outcome of one vendor primitive
pub(crate) enum Script<T> {
    Ok(T),
    SyncErr(String),
    DeferredErr(String),
}

impl<T: Clone + Send + 'static> Script<T> {
    fn run(&self) -> VendorResult<T> {
        match self {
            Script::Ok(value) => Ok(ReadyCall::ok(value.clone())),
            Script::SyncErr(msg) => Err(VendorError::new(msg.clone())),
            Script::DeferredErr(msg) => Ok(ReadyCall::err(VendorError::new(msg.clone()))),
        }
    }
}

/// A scriptable vendor media device
pub(crate) struct MockMediaDevice {
    uid: String,
    name: Mutex<String>,
    pub calls: Mutex<Vec<String>>,
    pub play_result: Mutex<Script<()>>,
    pub pause_result: Mutex<Script<()>>,
    pub stop_result: Mutex<Script<()>>,
    pub seek_result: Mutex<Script<()>>,
    pub duration_result: Mutex<Script<i64>>,
    pub position_result: Mutex<Script<i64>>,
    pub status_result: Mutex<Script<MediaStatus>>,
    pub media_info_result: Mutex<Script<VendorMediaInfo>>,
    pub set_source_result: Mutex<Script<()>>,
    pub last_seek: Mutex<Option<(SeekMode, i64)>>,
    pub last_media_source: Mutex<Option<(Option<String>, String, bool, bool)>>,
    pub status_listeners: Mutex<Vec<Arc<dyn StatusListener>>>,
    pub listeners_removed: AtomicUsize,
}

impl MockMediaDevice {
    pub fn new<S: Into<String>, N: Into<String>>(uid: S, name: N) -> Arc<Self> {
        Arc::new(Self {
            uid: uid.into(),
            name: Mutex::new(name.into()),
            calls: Mutex::new(Vec::new()),
            play_result: Mutex::new(Script::Ok(())),
            pause_result: Mutex::new(Script::Ok(())),
            stop_result: Mutex::new(Script::Ok(())),
            seek_result: Mutex::new(Script::Ok(())),
            duration_result: Mutex::new(Script::Ok(0)),
            position_result: Mutex::new(Script::Ok(0)),
            status_result: Mutex::new(Script::Ok(MediaStatus::new(MediaState::Playing))),
            media_info_result: Mutex::new(Script::Ok(VendorMediaInfo {
                source: "http://media".to_string(),
                metadata: r#"{"noreplay":true}"#.to_string(),
            })),
            set_source_result: Mutex::new(Script::Ok(())),
            last_seek: Mutex::new(None),
            last_media_source: Mutex::new(None),
            status_listeners: Mutex::new(Vec::new()),
            listeners_removed: AtomicUsize::new(0),
        })
    }

    pub fn rename<N: Into<String>>(&self, name: N) {
        *self.name.lock().unwrap() = name.into();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_listener_count(&self) -> usize {
        self.status_listeners.lock().unwrap().len()
    }

    /// Simulate a vendor status push to every registered listener
    pub fn push_status(&self, status: Option<MediaStatus>, position_ms: i64) {
        let listeners = self.status_listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.on_status_change(status.as_ref(), position_ms);
        }
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

impl fmt::Debug for MockMediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMediaDevice")
            .field("uid", &self.uid)
            .finish()
    }
}

impl DeviceHandle for MockMediaDevice {
    fn unique_identifier(&self) -> String {
        self.uid.clone()
    }

    fn name(&self) -> String {
        self.name.lock().unwrap().clone()
    }
}

impl MediaDevice for MockMediaDevice {
    fn play(&self) -> VendorResult<()> {
        self.record("play");
        self.play_result.lock().unwrap().run()
    }

    fn pause(&self) -> VendorResult<()> {
        self.record("pause");
        self.pause_result.lock().unwrap().run()
    }

    fn stop(&self) -> VendorResult<()> {
        self.record("stop");
        self.stop_result.lock().unwrap().run()
    }

    fn seek(&self, mode: SeekMode, position_ms: i64) -> VendorResult<()> {
        self.record("seek");
        *self.last_seek.lock().unwrap() = Some((mode, position_ms));
        self.seek_result.lock().unwrap().run()
    }

    fn duration(&self) -> VendorResult<i64> {
        self.record("duration");
        self.duration_result.lock().unwrap().run()
    }

    fn position(&self) -> VendorResult<i64> {
        self.record("position");
        self.position_result.lock().unwrap().run()
    }

    fn status(&self) -> VendorResult<MediaStatus> {
        self.record("status");
        self.status_result.lock().unwrap().run()
    }

    fn media_info(&self) -> VendorResult<VendorMediaInfo> {
        self.record("media_info");
        self.media_info_result.lock().unwrap().run()
    }

    fn set_media_source(
        &self,
        url: Option<&str>,
        metadata: &str,
        autoplay: bool,
        play_in_background: bool,
    ) -> VendorResult<()> {
        self.record("set_media_source");
        *self.last_media_source.lock().unwrap() = Some((
            url.map(str::to_string),
            metadata.to_string(),
            autoplay,
            play_in_background,
        ));
        self.set_source_result.lock().unwrap().run()
    }

    fn add_status_listener(&self, listener: Arc<dyn StatusListener>) {
        self.status_listeners.lock().unwrap().push(listener);
    }

    fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>) {
        let mut listeners = self.status_listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|candidate| !Arc::ptr_eq(candidate, listener));
        self.listeners_removed
            .fetch_add(before - listeners.len(), Ordering::SeqCst);
    }
}

/// Default scriptable device used by most command tests
pub(crate) fn mock_device() -> Arc<MockMediaDevice> {
    MockMediaDevice::new("UID", "CastStick")
}

/// A discovery adapter that records its lifecycle
#[derive(Default)]
pub(crate) struct MockDiscoveryAdapter {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub callback: Mutex<Option<Arc<dyn DiscoveryCallback>>>,
}

impl MockDiscoveryAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockDiscoveryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDiscoveryAdapter")
            .field("starts", &self.start_count())
            .field("stops", &self.stop_count())
            .finish()
    }
}

impl DiscoveryAdapter for MockDiscoveryAdapter {
    fn start_discovery(&self, callback: Arc<dyn DiscoveryCallback>) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn stop_discovery(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.callback.lock().unwrap() = None;
    }
}

/// A command listener that records every delivery
pub(crate) struct RecordingListener<T> {
    successes: Mutex<Vec<T>>,
    errors: Mutex<Vec<ServiceCommandError>>,
}

impl<T: Clone + Send> RecordingListener<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            successes: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub fn successes(&self) -> Vec<T> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ServiceCommandError> {
        self.errors.lock().unwrap().clone()
    }
}

impl<T: Clone + Send> ResponseListener<T> for RecordingListener<T> {
    fn on_success(&self, value: T) {
        self.successes.lock().unwrap().push(value);
    }

    fn on_error(&self, error: ServiceCommandError) {
        self.errors.lock().unwrap().push(error);
    }
}

/// A discovery listener that records every event and its emitting provider
#[derive(Default)]
pub(crate) struct RecordingDiscoveryListener {
    pub added: Mutex<Vec<(DiscoveryProvider, ServiceDescription)>>,
    pub removed: Mutex<Vec<(DiscoveryProvider, ServiceDescription)>>,
    pub failures: Mutex<Vec<(DiscoveryProvider, ServiceCommandError)>>,
}

impl RecordingDiscoveryListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn added(&self) -> Vec<ServiceDescription> {
        self.added
            .lock()
            .unwrap()
            .iter()
            .map(|(_, description)| description.clone())
            .collect()
    }

    pub fn added_providers(&self) -> Vec<DiscoveryProvider> {
        self.added
            .lock()
            .unwrap()
            .iter()
            .map(|(provider, _)| provider.clone())
            .collect()
    }

    pub fn removed(&self) -> Vec<ServiceDescription> {
        self.removed
            .lock()
            .unwrap()
            .iter()
            .map(|(_, description)| description.clone())
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }

    pub fn failure_providers(&self) -> Vec<DiscoveryProvider> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .map(|(provider, _)| provider.clone())
            .collect()
    }
}

impl DiscoveryListener for RecordingDiscoveryListener {
    fn on_service_added(&self, provider: &DiscoveryProvider, description: &ServiceDescription) {
        self.added
            .lock()
            .unwrap()
            .push((provider.clone(), description.clone()));
    }

    fn on_service_removed(&self, provider: &DiscoveryProvider, description: &ServiceDescription) {
        self.removed
            .lock()
            .unwrap()
            .push((provider.clone(), description.clone()));
    }

    fn on_discovery_failed(&self, provider: &DiscoveryProvider, error: ServiceCommandError) {
        self.failures
            .lock()
            .unwrap()
            .push((provider.clone(), error));
    }
}
