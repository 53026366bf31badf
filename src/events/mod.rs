//! Paper notifications.
//!
//! Every successful `AddPaper` produces one [`PaperEvent`](crate::models::PaperEvent)
//! on the `paper_events` topic. Delivery is at-most-once and best-effort:
//!
//! - [`EventPublisher`] queues notifications for a single worker task, so the
//!   RPC reply never waits on delivery;
//! - [`Topic`] fans each notification out to every current subscriber, with
//!   no replay for late subscribers;
//! - [`EventSubscription`] is the client end of a subscription over the network.

pub mod publisher;
pub mod subscription;
pub mod topic;

pub use publisher::EventPublisher;
pub use subscription::EventSubscription;
pub use topic::{Subscriber, Topic};

/// The well-known topic new-paper notifications are published on
pub const PAPER_EVENTS_TOPIC: &str = "paper_events";
