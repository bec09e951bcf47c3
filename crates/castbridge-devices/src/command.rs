/*!
 * Command dispatch for CastBridge services.
 *
 * Every capability operation funnels through [`dispatch`], which normalizes
 * the two vendor failure shapes (synchronous error from the call itself, or
 * an async handle resolving to an error) into a single listener callback
 * contract. No operation here blocks the calling thread; success and failure
 * are always delivered through the listener.
 */
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::adapter::{MediaDevice, VendorError, VendorResult};

/// Error delivered on a command listener's error channel
#[derive(Error, Debug, Clone)]
pub enum ServiceCommandError {
    /// No vendor device handle is bound to the service
    #[error("Device is not connected")]
    NotConnected,

    /// The operation is not available on this device class
    #[error("Operation is not supported")]
    NotSupported,

    /// A vendor call failed, either synchronously or on async resolution
    #[error("{message}")]
    VendorCall {
        /// Operation-specific human-readable message (e.g. "Error seeking")
        message: String,
        /// The underlying vendor failure
        #[source]
        source: VendorError,
    },
}

impl ServiceCommandError {
    /// Wrap a vendor failure with an operation-specific message
    pub fn vendor<S: Into<String>>(message: S, source: VendorError) -> Self {
        ServiceCommandError::VendorCall {
            message: message.into(),
            source,
        }
    }
}

/// Receiver of a single command outcome
pub trait ResponseListener<T>: Send + Sync {
    /// The operation succeeded
    fn on_success(&self, value: T);

    /// The operation failed
    fn on_error(&self, error: ServiceCommandError);
}

/// Shared handle to a response listener
pub type Listener<T> = Arc<dyn ResponseListener<T>>;

/// A [`ResponseListener`] built from a pair of closures
pub struct FnResponseListener<T> {
    on_success: Box<dyn Fn(T) + Send + Sync>,
    on_error: Box<dyn Fn(ServiceCommandError) + Send + Sync>,
}

impl<T> FnResponseListener<T> {
    /// Create a listener from success and error closures
    pub fn new<S, E>(on_success: S, on_error: E) -> Arc<Self>
    where
        S: Fn(T) + Send + Sync + 'static,
        E: Fn(ServiceCommandError) + Send + Sync + 'static,
    {
        Arc::new(Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        })
    }
}

impl<T> ResponseListener<T> for FnResponseListener<T> {
    fn on_success(&self, value: T) {
        (self.on_success)(value);
    }

    fn on_error(&self, error: ServiceCommandError) {
        (self.on_error)(error);
    }
}

/// Deliver an error to an optional listener; absent listeners are a no-op
pub fn notify_error<T>(listener: &Option<Listener<T>>, error: ServiceCommandError) {
    if let Some(listener) = listener {
        listener.on_error(error);
    }
}

/// Deliver a [`ServiceCommandError::NotSupported`] without touching the
/// vendor layer
pub fn notify_not_supported<T>(listener: &Option<Listener<T>>) {
    notify_error(listener, ServiceCommandError::NotSupported);
}

/// Invoke one vendor command primitive and normalize its outcome.
///
/// Fails fast with [`ServiceCommandError::NotConnected`] when no device
/// handle is bound. Otherwise the vendor call's synchronous error, the async
/// handle's deferred error, and a failing `convert` step all surface as a
/// single [`ServiceCommandError::VendorCall`] carrying `message`; success is
/// converted to the protocol-neutral type and delivered once.
pub(crate) fn dispatch<T, U, F, C>(
    device: Option<&Arc<dyn MediaDevice>>,
    message: &str,
    listener: Option<Listener<U>>,
    call: F,
    convert: C,
) where
    T: Send + 'static,
    U: 'static,
    F: FnOnce(&dyn MediaDevice) -> VendorResult<T>,
    C: FnOnce(T) -> Result<U, VendorError> + Send + 'static,
{
    let device = match device {
        Some(device) => device,
        None => {
            debug!("Command rejected, no device handle bound");
            notify_error(&listener, ServiceCommandError::NotConnected);
            return;
        }
    };

    match call(device.as_ref()) {
        Ok(handle) => {
            let message = message.to_string();
            handle.when_done(Box::new(move |result| {
                match result.and_then(convert) {
                    Ok(value) => {
                        if let Some(listener) = listener {
                            listener.on_success(value);
                        }
                    }
                    Err(source) => {
                        notify_error(&listener, ServiceCommandError::vendor(message, source));
                    }
                }
            }));
        }
        Err(source) => {
            notify_error(&listener, ServiceCommandError::vendor(message, source));
        }
    }
}
