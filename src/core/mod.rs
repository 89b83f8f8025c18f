pub mod error;
pub mod http;
pub mod message;
pub mod options;
pub mod publisher;
pub mod queue;
pub mod subscriber;
pub mod topics;
