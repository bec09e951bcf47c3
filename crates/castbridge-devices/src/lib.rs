/*!
 * CastBridge Devices
 *
 * This crate provides device discovery, capability resolution, command
 * dispatch and play state subscriptions for the CastBridge system.
 */

#![warn(missing_docs)]

// Re-export core types
pub use castbridge_core::prelude;

pub mod adapter;
pub mod adapters;
pub mod capability;
pub mod command;
pub mod discovery;
pub mod media;
pub mod service;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the types most callers touch
pub use capability::{CapabilityInterface, CapabilityPriority, CapabilityRegistry};
pub use command::{FnResponseListener, Listener, ResponseListener, ServiceCommandError};
pub use discovery::{DiscoveryListener, DiscoveryProvider, ServiceDescription};
pub use media::{MediaInfo, MediaLaunchObject};
pub use service::{DeviceService, MediaControl, MediaPlayer, MediaService};
pub use subscription::{PlayStateStatus, PlayStateSubscription};

/// CastBridge devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the device system
pub fn init() -> Result<(), castbridge_core::error::Error> {
    tracing::info!("CastBridge Devices {} initialized", VERSION);
    Ok(())
}
