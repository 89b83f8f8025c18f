//! ntfy-client – async client for topic-based HTTP push notification servers.
//!
//! This crate exports
//!  * `client` – the [`Client`]: publish, poll, subscribe, unsubscribe
//!  * `core`   – message decoding, request options, the publish and stream
//!    engines, the reconnect loop and the subscription registry
//!  * `config` – YAML/TOML client configuration with env overrides
//!  * `logging` – tracing subscriber setup for binaries and tests
//!
//! ```no_run
//! use ntfy_client::{Client, Config};
//! use ntfy_client::core::options::{with_priority, with_title};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(Config::default());
//! client
//!     .publish("mytopic", "Backup finished", &[with_title("backup"), with_priority("high")])
//!     .await?;
//!
//! let id = client.subscribe("mytopic", &[])?;
//! while let Some(message) = client.messages().next().await {
//!     println!("{}: {}", message.topic, message.message);
//! #   break;
//! }
//! client.unsubscribe(&id);
//! # Ok(())
//! # }
//! ```

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod client;
pub mod config;
pub mod core;
pub mod logging;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use crate::client::Client;
pub use crate::config::{Config, ConfigError, SubscribeEntry};
pub use crate::core::error::{ClientError, PollError};
pub use crate::core::message::{Attachment, Message};
pub use crate::core::subscriber::SubscriptionId;
