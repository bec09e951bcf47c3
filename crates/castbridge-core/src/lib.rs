/*!
 * CastBridge Core
 *
 * This crate provides the core functionality shared by the CastBridge
 * crates: identifiers, error types, configuration, and logging.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;

/// Re-export of dependencies that are part of the public API
pub mod deps {
    pub use serde;
    pub use serde_json;
    pub use tracing;
    pub use uuid;
}

/// CastBridge core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization
pub fn init() -> Result<(), error::Error> {
    logging::init()?;
    tracing::info!("CastBridge Core {} initialized", VERSION);
    Ok(())
}
