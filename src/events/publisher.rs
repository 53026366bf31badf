//! Bounded publish queue with a single worker feeding the topic.
//!
//! The RPC path only ever calls [`EventPublisher::publish`], which never
//! waits: if the queue is full the notification is dropped and logged.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Topic;
use crate::models::PaperEvent;

/// Default number of notifications waiting for the worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Handle used by the RPC layer to schedule notifications
#[derive(Debug, Clone)]
pub struct EventPublisher {
    queue: mpsc::Sender<PaperEvent>,
}

impl EventPublisher {
    /// Start the publish worker for `topic`
    ///
    /// The worker runs until every `EventPublisher` clone has been dropped.
    pub fn spawn(topic: Topic, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, topic));
        (Self { queue }, worker)
    }

    /// Schedule a notification without waiting
    ///
    /// Returns `false` if the notification was dropped.
    pub fn publish(&self, event: PaperEvent) -> bool {
        match self.queue.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(id = event.id, "Publish queue full, notification dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::warn!(id = event.id, "Publish worker stopped, notification dropped");
                false
            }
        }
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<PaperEvent>, topic: Topic) {
    tracing::debug!(topic = topic.name(), "Publish worker started");

    while let Some(event) = receiver.recv().await {
        let id = event.id;
        let delivered = topic.publish(event);
        tracing::trace!(topic = topic.name(), id, delivered, "Published notification");
    }

    tracing::debug!(topic = topic.name(), "Publish worker stopped");
}
