//! Fanout topic carrying [`PaperEvent`]s to every current subscriber.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::models::PaperEvent;

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// A named broadcast topic
///
/// Every [`Subscriber`] gets its own view of the stream: a subscriber only
/// sees events published after it subscribed, and one that falls more than
/// the capacity behind loses the overflow rather than blocking the publisher.
#[derive(Debug, Clone)]
pub struct Topic {
    name: Arc<str>,
    sender: broadcast::Sender<Arc<PaperEvent>>,
}

impl Topic {
    /// Create a topic with the given per-subscriber capacity
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribe and receive every event published from now on
    pub fn subscribe(&self) -> Subscriber {
        self.subscribe_with(|| 0)
    }

    /// Subscribe, then fix a watermark: events with an id at or below it are
    /// discarded.
    ///
    /// The receiver is attached before `watermark` runs, so any paper added
    /// after the watermark was read is guaranteed to be delivered (subject to
    /// lag), and any paper added before it never is.
    pub fn subscribe_with(&self, watermark: impl FnOnce() -> u64) -> Subscriber {
        let receiver = self.sender.subscribe();
        Subscriber {
            topic: Arc::clone(&self.name),
            receiver,
            watermark: watermark(),
        }
    }

    /// Fan an event out to all current subscribers, returning how many
    /// subscribers it was queued for
    pub fn publish(&self, event: PaperEvent) -> usize {
        // An error only means nobody is listening right now
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One listener's delivery queue on a [`Topic`]
#[derive(Debug)]
pub struct Subscriber {
    topic: Arc<str>,
    receiver: broadcast::Receiver<Arc<PaperEvent>>,
    watermark: u64,
}

impl Subscriber {
    /// Wait for the next event; `None` once the topic has been dropped
    pub async fn recv(&mut self) -> Option<Arc<PaperEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.id <= self.watermark => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        topic = %self.topic,
                        skipped,
                        "Subscriber lagged, notifications dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }
}
