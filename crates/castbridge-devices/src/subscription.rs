/*!
 * Play state translation and subscription fan-out.
 *
 * [`PlayStateSubscription`] is the single vendor-level status listener a
 * service registers per device. It translates raw vendor states into
 * [`PlayStateStatus`], swallows identical consecutive states, and fans the
 * result out to every subscribed command listener.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::adapter::{MediaDevice, MediaState, MediaStatus, StatusListener};
use crate::command::Listener;

/// Protocol-neutral playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayStateStatus {
    /// No media loaded
    Idle,
    /// Media is playing
    Playing,
    /// Media is paused
    Paused,
    /// Media is loading or buffering
    Buffering,
    /// Playback reached the end
    Finished,
    /// The vendor state has no neutral equivalent, or no state was reported
    Unknown,
}

impl From<MediaState> for PlayStateStatus {
    fn from(state: MediaState) -> Self {
        match state {
            MediaState::NoSource => PlayStateStatus::Idle,
            MediaState::PreparingMedia => PlayStateStatus::Buffering,
            MediaState::Playing => PlayStateStatus::Playing,
            MediaState::Paused => PlayStateStatus::Paused,
            MediaState::Finished => PlayStateStatus::Finished,
            MediaState::ReadyToPlay | MediaState::Seeking | MediaState::Error => {
                PlayStateStatus::Unknown
            }
        }
    }
}

/// Translate an optional vendor status; an absent status is [`Unknown`](PlayStateStatus::Unknown)
pub(crate) fn translate_status(status: Option<&MediaStatus>) -> PlayStateStatus {
    status.map_or(PlayStateStatus::Unknown, |s| s.state.into())
}

/// A live play state subscription on one device.
///
/// Holds the subscribed listeners (identity deduplicated, in registration
/// order) and the last emitted state. Implements [`StatusListener`] so the
/// owning service can register it with the vendor device exactly once.
pub struct PlayStateSubscription {
    device: Arc<dyn MediaDevice>,
    listeners: Mutex<Vec<Listener<PlayStateStatus>>>,
    last_state: Mutex<Option<PlayStateStatus>>,
    unsubscribed: AtomicBool,
}

impl PlayStateSubscription {
    /// Create a subscription bound to the device it will deregister from
    pub(crate) fn new(device: Arc<dyn MediaDevice>) -> Arc<Self> {
        Arc::new(Self {
            device,
            listeners: Mutex::new(Vec::new()),
            last_state: Mutex::new(None),
            unsubscribed: AtomicBool::new(false),
        })
    }

    /// Add a listener. The same listener (by identity) is only added once.
    pub fn add_listener(&self, listener: Listener<PlayStateStatus>) {
        let mut listeners = self.listeners.lock().unwrap();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a listener
    pub fn remove_listener(&self, listener: &Listener<PlayStateStatus>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Number of subscribed listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet
    pub fn is_active(&self) -> bool {
        !self.unsubscribed.load(Ordering::SeqCst)
    }

    /// Deregister from the vendor device. Exactly one vendor removal happens
    /// no matter how often this is called.
    pub fn unsubscribe(self: &Arc<Self>) {
        if self.unsubscribed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Removing vendor status listener");
        let listener: Arc<dyn StatusListener> = self.clone();
        self.device.remove_status_listener(&listener);
        self.listeners.lock().unwrap().clear();
    }
}

impl StatusListener for PlayStateSubscription {
    fn on_status_change(&self, status: Option<&MediaStatus>, _position_ms: i64) {
        let state = translate_status(status);
        {
            let mut last = self.last_state.lock().unwrap();
            if *last == Some(state) {
                trace!(?state, "Unchanged play state, swallowed");
                return;
            }
            *last = Some(state);
        }

        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.on_success(state);
        }
    }
}

impl std::fmt::Debug for PlayStateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayStateSubscription")
            .field("listeners", &self.listener_count())
            .field("last_state", &*self.last_state.lock().unwrap())
            .field("active", &self.is_active())
            .finish()
    }
}
