use crate::core::error::ClientError;

/// Longest short topic name a server accepts.
pub const MAX_TOPIC_LEN: usize = 64;

/// Turns a topic string into a full topic endpoint URL.
///
/// - `http://…` / `https://…` is returned unchanged
/// - `myhost.lan/mytopic` becomes `https://myhost.lan/mytopic`
/// - `mytopic` becomes `<default_host>/mytopic`, if it is a valid topic name
pub fn expand_topic_url(topic: &str, default_host: &str) -> Result<String, ClientError> {
    if topic.starts_with("http://") || topic.starts_with("https://") {
        return Ok(topic.to_owned());
    }
    if topic.contains('/') {
        return Ok(format!("https://{topic}"));
    }
    if !is_valid_topic(topic) {
        return Err(ClientError::InvalidTopic(topic.to_owned()));
    }
    Ok(format!("{default_host}/{topic}"))
}

/// `[-_A-Za-z0-9]{1,64}`
pub fn is_valid_topic(topic: &str) -> bool {
    (1..=MAX_TOPIC_LEN).contains(&topic.len())
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Topic URL without its scheme, used as a log prefix.
pub fn short_topic_url(topic_url: &str) -> &str {
    topic_url
        .strip_prefix("https://")
        .or_else(|| topic_url.strip_prefix("http://"))
        .unwrap_or(topic_url)
}
