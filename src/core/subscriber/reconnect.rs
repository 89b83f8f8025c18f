use std::time::Duration;

use flume::Sender;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::error::ClientError;
use crate::core::message::Message;
use crate::core::options::SubscribeOption;
use crate::core::subscriber::stream::stream_messages;
use crate::core::topics::short_topic_url;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Parameters of one live subscription's connection loop.
#[derive(Debug, Clone)]
pub struct SubscriptionTask {
    pub http: Client,
    pub topic_url: String,
    pub subscription_id: String,
    pub sink: Sender<Message>,
    pub options: Vec<SubscribeOption>,
    pub reconnect_delay: Duration,
}

/// Keeps a subscription connected until `cancel` fires.
///
/// Connecting → Waiting → Connecting … Every attempt, whether it failed or the
/// server closed the stream, is followed by the same fixed delay. Transport,
/// status and decode failures are all logged and retried alike, without
/// limit. Cancellation aborts an in-flight attempt and is checked again at the
/// end of every attempt before waiting.
///
/// The delay is fixed, not exponential.
///
/// Returns the error of the last attempt, if that attempt failed. An attempt
/// cut short by cancellation counts as healthy.
pub async fn run_subscription(
    task: SubscriptionTask,
    cancel: CancellationToken,
) -> Option<ClientError> {
    let short = short_topic_url(&task.topic_url).to_owned();
    let mut last_error: Option<ClientError> = None;

    loop {
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Canceled),
            result = stream_messages(
                &task.http,
                &task.topic_url,
                &task.subscription_id,
                &task.sink,
                &task.options,
            ) => result,
        };

        match attempt {
            Err(ClientError::Canceled) => last_error = None,
            Err(err) => {
                warn!("{} Connection failed: {}", short, err);
                last_error = Some(err);
            }
            Ok(()) => last_error = None,
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(task.reconnect_delay) => {}
        }
    }

    match &last_error {
        Some(err) => info!("{} Connection exited (last error: {})", short, err),
        None => info!("{} Connection exited", short),
    }
    last_error
}
