//! Wire messages and the line decoder.
//!
//! Every event a server emits, whether as the response to a publish or as one
//! line of a JSON stream, is decoded here and nowhere else.

use serde::Deserialize;

use crate::core::error::Result;

/// Event kind of an actual notification. Everything else is stream control.
pub const MESSAGE_EVENT: &str = "message";
pub const OPEN_EVENT: &str = "open";
pub const KEEPALIVE_EVENT: &str = "keepalive";

/// A decoded server event plus the client-side context it arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub event: String,
    pub time: i64,
    pub expires: i64,
    pub topic: String,
    pub message: String,
    pub title: String,
    /// 1 (min) to 5 (max); 0 when the server omitted it.
    pub priority: u8,
    pub tags: Vec<String>,
    pub click: String,
    pub icon: String,
    pub attachment: Option<Attachment>,

    /// Resolved topic URL this message was read from.
    #[serde(skip)]
    pub topic_url: String,
    /// Receiving subscription; empty for publish and poll results.
    #[serde(skip)]
    pub subscription_id: String,
    /// The exact line the message was decoded from.
    #[serde(skip)]
    pub raw: String,
}

impl Message {
    pub fn is_message(&self) -> bool {
        self.event == MESSAGE_EVENT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
    pub expires: i64,
    pub url: String,
    /// Uploader identity. Server bookkeeping only, never read off the wire.
    #[serde(skip)]
    pub owner: String,
}

/// Decodes one JSON line and stamps it with its topic URL, subscription id and
/// the raw text.
pub fn decode_message(line: &str, topic_url: &str, subscription_id: &str) -> Result<Message> {
    let mut message: Message = serde_json::from_str(line)?;
    message.topic_url = topic_url.to_owned();
    message.subscription_id = subscription_id.to_owned();
    message.raw = line.to_owned();
    Ok(message)
}
