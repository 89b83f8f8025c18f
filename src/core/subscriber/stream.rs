use std::io;

use flume::Sender;
use futures::TryStreamExt;
use reqwest::Client;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, trace};

use crate::core::error::Result;
use crate::core::http::status_error;
use crate::core::message::{decode_message, Message};
use crate::core::options::{apply_options, RequestSpec, SubscribeOption};
use crate::core::queue::push;
use crate::core::topics::short_topic_url;

/// Opens `<topic_url>/json` and forwards every `message` event to `sink`.
///
/// Each line of the response is decoded on its own. Control events (`open`,
/// `keepalive` and anything unknown) are decoded but dropped. The first line
/// that fails to decode ends the attempt with an error; the rest of the stream
/// is not read.
///
/// Returns `Ok(())` when the server closes the stream, which is what a poll
/// request ends with. Never retries.
pub async fn stream_messages(
    http: &Client,
    topic_url: &str,
    subscription_id: &str,
    sink: &Sender<Message>,
    options: &[SubscribeOption],
) -> Result<()> {
    let mut spec = RequestSpec::new();
    apply_options(&mut spec, options)?;

    let short = short_topic_url(topic_url);
    let stream_url = format!("{topic_url}/json");
    debug!("{} Listening to {}", short, stream_url);

    let response = spec.apply_to(http.get(&stream_url)).send().await?;
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    let body = Box::pin(response.bytes_stream().map_err(io::Error::other));
    let mut lines = StreamReader::new(body).lines();

    while let Some(line) = lines.next_line().await? {
        let message = decode_message(&line, topic_url, subscription_id)?;
        trace!("{} Message received: {}", short, line);
        if message.is_message() {
            push(sink, message).await?;
        }
    }
    Ok(())
}
