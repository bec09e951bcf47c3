/*!
 * Vendor adapter boundary for CastBridge.
 *
 * This module defines the interfaces a protocol/vendor SDK must present to
 * the core: raw discovery start/stop with push callbacks, and per-device
 * command primitives. Vendors fail in two incompatible shapes (an immediate
 * error from the call itself, or an async handle that resolves to an error);
 * both are funneled through [`VendorResult`] so the rest of the core only
 * ever sees one failure channel.
 */
use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;

/// Error payload produced by a vendor SDK call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct VendorError(String);

impl VendorError {
    /// Create a new vendor error with the given message
    pub fn new<S: Into<String>>(msg: S) -> Self {
        VendorError(msg.into())
    }

    /// Get the vendor-supplied message
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Completion callback for an asynchronous vendor call
pub type Completion<T> = Box<dyn FnOnce(Result<T, VendorError>) + Send>;

/// Handle to an in-flight vendor call.
///
/// The handle may resolve on any thread and at any time; a handle that never
/// resolves simply never fires its completion (the core does not time out).
pub trait AsyncCall<T>: Send {
    /// Register the completion to invoke when the call resolves
    fn when_done(self: Box<Self>, completion: Completion<T>);
}

/// Result of invoking a vendor command primitive.
///
/// `Err` is the synchronous failure shape (e.g. the vendor object is in the
/// wrong lifecycle state); a deferred failure is an `Ok` handle that resolves
/// to `Err` later.
pub type VendorResult<T> = Result<Box<dyn AsyncCall<T>>, VendorError>;

/// An [`AsyncCall`] that is already resolved
pub struct ReadyCall<T>(Result<T, VendorError>);

impl<T> ReadyCall<T> {
    /// A call that already succeeded with `value`
    pub fn ok(value: T) -> Box<Self> {
        Box::new(ReadyCall(Ok(value)))
    }

    /// A call that already failed with `error`
    pub fn err(error: VendorError) -> Box<Self> {
        Box::new(ReadyCall(Err(error)))
    }
}

impl<T: Send> AsyncCall<T> for ReadyCall<T> {
    fn when_done(self: Box<Self>, completion: Completion<T>) {
        completion(self.0);
    }
}

/// Identity of a vendor-discovered device
pub trait DeviceHandle: Send + Sync + Debug {
    /// Vendor-supplied stable unique identifier
    fn unique_identifier(&self) -> String;

    /// Human-readable device name
    fn name(&self) -> String;
}

/// Playback state as reported by the vendor SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaState {
    /// No media source is loaded
    NoSource,
    /// The device is preparing/loading media
    PreparingMedia,
    /// Media is loaded and ready to play
    ReadyToPlay,
    /// Media is playing
    Playing,
    /// Media is paused
    Paused,
    /// A seek is in progress
    Seeking,
    /// Playback finished
    Finished,
    /// The device reported a playback error
    Error,
}

/// Raw playback status pushed or polled from the vendor SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaStatus {
    /// The vendor playback state
    pub state: MediaState,
}

impl MediaStatus {
    /// Create a status for the given state
    pub fn new(state: MediaState) -> Self {
        Self { state }
    }
}

/// Media information as reported by the vendor SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorMediaInfo {
    /// The media source URL
    pub source: String,
    /// The metadata envelope as a JSON string
    pub metadata: String,
}

/// Seek addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Seek to an absolute position
    Absolute,
    /// Seek relative to the current position
    Relative,
}

/// Receiver of raw vendor status pushes.
///
/// Registered at most once per live subscription; see
/// [`crate::subscription::PlayStateSubscription`].
pub trait StatusListener: Send + Sync {
    /// Called by the vendor on every status push. A vendor may push an
    /// absent status; the core must tolerate it.
    fn on_status_change(&self, status: Option<&MediaStatus>, position_ms: i64);
}

/// Per-device command primitives presented by a vendor SDK
pub trait MediaDevice: DeviceHandle {
    /// Resume or start playback
    fn play(&self) -> VendorResult<()>;

    /// Pause playback
    fn pause(&self) -> VendorResult<()>;

    /// Stop playback
    fn stop(&self) -> VendorResult<()>;

    /// Seek to a position in milliseconds
    fn seek(&self, mode: SeekMode, position_ms: i64) -> VendorResult<()>;

    /// Get the media duration in milliseconds
    fn duration(&self) -> VendorResult<i64>;

    /// Get the playback position in milliseconds
    fn position(&self) -> VendorResult<i64>;

    /// Get the current playback status
    fn status(&self) -> VendorResult<MediaStatus>;

    /// Get information about the loaded media
    fn media_info(&self) -> VendorResult<VendorMediaInfo>;

    /// Load a media source with a metadata envelope
    fn set_media_source(
        &self,
        url: Option<&str>,
        metadata: &str,
        autoplay: bool,
        play_in_background: bool,
    ) -> VendorResult<()>;

    /// Register a status push listener
    fn add_status_listener(&self, listener: Arc<dyn StatusListener>);

    /// Deregister a previously registered status push listener
    fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>);
}

/// Callbacks a vendor discovery transport pushes into the core.
///
/// Vendors may deliver absent device handles; implementations must absorb
/// them without raising.
pub trait DiscoveryCallback: Send + Sync {
    /// A device appeared (or re-announced itself)
    fn device_discovered(&self, device: Option<Arc<dyn MediaDevice>>);

    /// A device disappeared
    fn device_lost(&self, device: Option<Arc<dyn MediaDevice>>);

    /// The discovery transport failed; discovery may recover later
    fn discovery_failure(&self);
}

/// Discovery start/stop primitives presented by a vendor SDK
pub trait DiscoveryAdapter: Send + Sync + Debug {
    /// Begin vendor discovery, pushing events into `callback`
    fn start_discovery(&self, callback: Arc<dyn DiscoveryCallback>);

    /// Stop vendor discovery and release the callback
    fn stop_discovery(&self);
}
