/*!
 * Vendor adapter implementations.
 *
 * Production vendor SDK bindings plug in here by implementing the traits in
 * [`crate::adapter`]. The built-in [`simulated`] adapter provides an
 * in-process device for demos and integration-style tests.
 */
pub mod simulated;
