use reqwest::{Body, Client};
use tracing::debug;

use crate::core::error::{ClientError, Result};
use crate::core::http::{read_capped, MAX_RESPONSE_BYTES};
use crate::core::message::{decode_message, Message};
use crate::core::options::{apply_options, PublishOption, RequestSpec};
use crate::core::topics::short_topic_url;

/// Sends `body` to `topic_url` and returns the message the server created.
///
/// Options are applied before anything is sent; an invalid option fails the
/// call without touching the network. The response body is read up to
/// [`MAX_RESPONSE_BYTES`]. A non-success status becomes
/// [`ClientError::Server`] carrying the trimmed body text.
///
/// There is no retry here. A failed publish is reported to the caller as is.
pub async fn publish(
    http: &Client,
    topic_url: &str,
    body: Body,
    options: &[PublishOption],
) -> Result<Message> {
    let mut spec = RequestSpec::new();
    apply_options(&mut spec, options)?;

    debug!(
        "{} Publishing message with headers {:?}",
        short_topic_url(topic_url),
        spec.headers()
    );

    let response = spec.apply_to(http.post(topic_url)).body(body).send().await?;
    let status = response.status();
    let raw = read_capped(response, MAX_RESPONSE_BYTES).await?;
    let text = String::from_utf8_lossy(&raw);

    if !status.is_success() {
        return Err(ClientError::Server {
            status: status.as_u16(),
            message: text.trim().to_owned(),
        });
    }

    decode_message(&text, topic_url, "")
}
