//! Publish engine: one POST per message, no retries.
#[allow(clippy::module_inception)]
pub mod publisher;

pub use publisher::publish;
