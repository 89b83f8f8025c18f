//! Topic addressing: short names, bare host paths and full URLs.

pub mod resolver;

pub use resolver::{expand_topic_url, short_topic_url};
