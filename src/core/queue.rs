//! Shared output queue.
//!
//! All live subscriptions of one client funnel into a single bounded queue.
//! Pushing into a full queue waits, which stalls every subscription that is
//! trying to deliver at that moment, not only the one whose consumer is slow.

use flume::{Receiver, Sender, TryRecvError};

use crate::core::error::{ClientError, Result};
use crate::core::message::Message;

pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// The queue keeps a sender of its own, so it never closes while it lives:
/// [`MessageQueue::next`] waits for new subscriptions instead of returning
/// `None` when none is running.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    capacity: usize,
}

impl MessageQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Producer end handed to subscription loops.
    pub fn sender(&self) -> Sender<Message> {
        self.tx.clone()
    }

    /// Consumer end. Every clone competes for the same messages.
    pub fn receiver(&self) -> Receiver<Message> {
        self.rx.clone()
    }

    /// Waits for the next message. Returns `None` only if the queue was closed,
    /// which cannot happen while this handle exists.
    pub async fn next(&self) -> Option<Message> {
        self.rx.recv_async().await.ok()
    }

    pub fn try_next(&self) -> Option<Message> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Blocking push. Waits while the queue is full.
pub async fn push(tx: &Sender<Message>, message: Message) -> Result<()> {
    tx.send_async(message).await.map_err(|_| ClientError::QueueClosed)
}
