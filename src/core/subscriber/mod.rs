//! Subscriber side of the client.
//!
//! - `stream`: one streaming GET, decoded line by line
//! - `reconnect`: the retry loop that keeps a live subscription connected
//! - `registry`: live subscriptions and their cancellation tokens

pub mod reconnect;
pub mod registry;
pub mod stream;

pub use reconnect::{run_subscription, SubscriptionTask, DEFAULT_RECONNECT_DELAY};
pub use registry::{Subscription, SubscriptionId, SubscriptionRegistry};
pub use stream::stream_messages;
