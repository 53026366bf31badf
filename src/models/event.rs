//! Notification broadcast on the `paper_events` topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paper was registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperEvent {
    pub id: u64,
    pub author: String,
    pub title: String,
    pub added_at: DateTime<Utc>,
}
