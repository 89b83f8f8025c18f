use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Length of generated subscription ids.
pub const SUBSCRIPTION_ID_LEN: usize = 10;

/// Unique identifier for a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    /// Fresh random alphanumeric id of [`SUBSCRIPTION_ID_LEN`] characters,
    /// cut from a v4 UUID.
    pub fn random() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(SUBSCRIPTION_ID_LEN);
        SubscriptionId(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(s: &str) -> Self {
        SubscriptionId(s.to_owned())
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.0
    }
}

impl Borrow<str> for SubscriptionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for SubscriptionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A live subscription: its topic and the handle that stops its loop.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    topic_url: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    /// Signals the loop to stop. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits until the subscription's loop has exited.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// [`SubscriptionRegistry`] maps subscription ids to their cancellation handles.
///
/// Backed by a DashMap: inserting and removing an id locks only the shard
/// holding it, and only for the map update itself.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<SubscriptionId, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }

    /// Registers a new subscription under a fresh id and starts its loop.
    ///
    /// `start` receives the id and the subscription's cancellation token and
    /// must spawn the loop, returning its handle.
    pub fn insert_with<F>(&self, topic_url: &str, start: F) -> SubscriptionId
    where
        F: FnOnce(&SubscriptionId, CancellationToken) -> JoinHandle<()>,
    {
        loop {
            let id = SubscriptionId::random();
            if let Entry::Vacant(slot) = self.subscriptions.entry(id.clone()) {
                let cancel = CancellationToken::new();
                let task = start(&id, cancel.clone());
                slot.insert(Subscription {
                    id: id.clone(),
                    topic_url: topic_url.to_owned(),
                    cancel,
                    task,
                });
                debug!(subscription_id = %id, "Registered subscription for {}", topic_url);
                return id;
            }
        }
    }

    /// Removes and cancels a subscription. Unknown ids are ignored.
    pub fn remove(&self, id: &str) -> Option<Subscription> {
        let (_, subscription) = self.subscriptions.remove(id)?;
        subscription.cancel();
        Some(subscription)
    }

    /// Removes and cancels every subscription.
    pub fn remove_all(&self) -> Vec<Subscription> {
        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subscriptions.contains_key(id)
    }

    /// Lists `(id, topic URL)` of every live subscription.
    pub fn list(&self) -> Vec<(SubscriptionId, String)> {
        self.subscriptions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().topic_url.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
