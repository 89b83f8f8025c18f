//! The client: publish, poll, subscribe and unsubscribe.
//!
//! A topic can be given as a full URL (`https://myhost.lan/mytopic`), as a
//! host and path which gets `https://` prepended (`myhost.lan/mytopic`), or as
//! a short name expanded with the configured default host
//! (`mytopic` → `https://ntfy.sh/mytopic`).

use std::sync::Arc;

use reqwest::Body;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::config::Config;
use crate::core::error::{ClientError, PollError, Result};
use crate::core::message::Message;
use crate::core::options::{apply_options, with_poll, PublishOption, RequestSpec, SubscribeOption};
use crate::core::publisher;
use crate::core::queue::MessageQueue;
use crate::core::subscriber::{
    run_subscription, stream_messages, SubscriptionId, SubscriptionRegistry, SubscriptionTask,
};
use crate::core::topics::{expand_topic_url, short_topic_url};

/// Publishes to and subscribes to topics.
///
/// Messages of every live subscription arrive on one shared bounded queue,
/// see [`Client::messages`]. Dropping the client cancels all subscriptions.
#[derive(Debug)]
pub struct Client {
    config: Arc<Config>,
    http: reqwest::Client,
    subscriptions: SubscriptionRegistry,
    messages: MessageQueue,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self::with_http(config, reqwest::Client::new())
    }

    /// Uses a preconfigured HTTP client (proxies, TLS roots, user agent …).
    pub fn with_http(config: Config, http: reqwest::Client) -> Self {
        let messages = MessageQueue::bounded(config.queue_capacity.max(1));
        Self {
            config: Arc::new(config),
            http,
            subscriptions: SubscriptionRegistry::new(),
            messages,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared queue that receives new messages of all subscribed topics.
    pub fn messages(&self) -> &MessageQueue {
        &self.messages
    }

    /// Publishes a text message. See [`Client::publish_body`].
    pub async fn publish(
        &self,
        topic: &str,
        message: impl Into<String>,
        options: &[PublishOption],
    ) -> Result<Message> {
        self.publish_body(topic, Body::from(message.into()), options)
            .await
    }

    /// Publishes the contents of `reader`, streamed as the request body.
    pub async fn publish_reader<R>(
        &self,
        topic: &str,
        reader: R,
        options: &[PublishOption],
    ) -> Result<Message>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let body = Body::wrap_stream(ReaderStream::new(reader));
        self.publish_body(topic, body, options).await
    }

    /// Publishes `body` to `topic` and returns the message the server stored.
    ///
    /// Title, priority, tags and the like are passed as options, e.g.
    /// `with_title`, `with_priority`, `with_tags`, `with_delay`. A single
    /// attempt is made.
    pub async fn publish_body(
        &self,
        topic: &str,
        body: Body,
        options: &[PublishOption],
    ) -> Result<Message> {
        let topic_url = self.expand_topic_url(topic)?;
        publisher::publish(&self.http, &topic_url, body, options).await
    }

    /// Fetches the messages a topic currently holds, without subscribing.
    ///
    /// Blocks until the server closes the stream. By default the server
    /// returns what it has cached; use `with_since` and friends to change
    /// that. On failure, messages read before the error are returned inside
    /// the [`PollError`].
    pub async fn poll(
        &self,
        topic: &str,
        options: &[SubscribeOption],
    ) -> std::result::Result<Vec<Message>, PollError> {
        let topic_url = self.expand_topic_url(topic)?;
        debug!("{} Polling from topic", short_topic_url(&topic_url));

        let mut options = options.to_vec();
        options.push(with_poll());

        let (tx, rx) = flume::unbounded();
        let result = stream_messages(&self.http, &topic_url, "", &tx, &options).await;
        drop(tx);

        let messages: Vec<Message> = rx.drain().collect();
        match result {
            Ok(()) => Ok(messages),
            Err(error) => Err(PollError { messages, error }),
        }
    }

    /// Subscribes to a topic and returns the new subscription's id.
    ///
    /// A background task connects and keeps reconnecting until
    /// [`Client::unsubscribe`] is called; new messages land on
    /// [`Client::messages`]. Returns right away, before the first connection
    /// attempt. Only new messages are streamed unless an option such as
    /// `with_since_all` says otherwise.
    ///
    /// Fails with [`ClientError::NoRuntime`] outside a Tokio runtime.
    pub fn subscribe(&self, topic: &str, options: &[SubscribeOption]) -> Result<SubscriptionId> {
        let topic_url = self.expand_topic_url(topic)?;
        // Bad options would fail every attempt; report them now instead.
        apply_options(&mut RequestSpec::new(), options)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ClientError::NoRuntime)?;

        debug!("{} Subscribing to topic", short_topic_url(&topic_url));

        let id = self.subscriptions.insert_with(&topic_url, |id, cancel| {
            let task = SubscriptionTask {
                http: self.http.clone(),
                topic_url: topic_url.clone(),
                subscription_id: id.to_string(),
                sink: self.messages.sender(),
                options: options.to_vec(),
                reconnect_delay: self.config.reconnect_delay(),
            };
            runtime.spawn(async move {
                run_subscription(task, cancel).await;
            })
        });
        Ok(id)
    }

    /// Cancels a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, subscription_id: &str) {
        if self.subscriptions.remove(subscription_id).is_some() {
            debug!(subscription_id, "Unsubscribed");
        }
    }

    pub fn unsubscribe_all(&self) {
        self.subscriptions.remove_all();
    }

    /// `(id, topic URL)` of every live subscription.
    pub fn subscriptions(&self) -> Vec<(SubscriptionId, String)> {
        self.subscriptions.list()
    }

    /// Cancels all subscriptions and waits for their loops to finish.
    pub async fn shutdown(self) {
        for subscription in self.subscriptions.remove_all() {
            subscription.join().await;
        }
    }

    fn expand_topic_url(&self, topic: &str) -> Result<String> {
        expand_topic_url(topic, &self.config.default_host)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.subscriptions.remove_all();
    }
}
