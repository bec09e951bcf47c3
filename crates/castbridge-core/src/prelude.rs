/*!
 * Prelude module for CastBridge core.
 *
 * Re-exports the most commonly used items so downstream crates can
 * `use castbridge_core::prelude::*;`.
 */

pub use crate::config::BridgeConfig;
pub use crate::error::{Error, Result};
pub use crate::types::{Id, Metadata};
