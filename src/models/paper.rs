//! Paper model representing a document registered with the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::{PaperEvent, ServiceError};

/// A paper stored in the registry
///
/// Papers are created once by [`PaperRegistry::add`](crate::registry::PaperRegistry::add)
/// and never mutated afterwards. The content is held behind an `Arc` so that
/// readers can take it out of the registry without copying the bytes while
/// the read lock is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    /// Server-assigned identifier, starting at 1
    pub id: u64,

    /// Paper author
    pub author: String,

    /// Paper title
    pub title: String,

    /// Short format tag (usually the upload's file extension)
    pub format: String,

    /// Opaque paper content
    pub content: Arc<[u8]>,

    /// When the paper was registered
    pub added_at: DateTime<Utc>,
}

impl Paper {
    /// Listing entry for this paper (no content)
    pub fn summary(&self) -> PaperSummary {
        PaperSummary {
            id: self.id,
            author: self.author.clone(),
            title: self.title.clone(),
        }
    }

    /// Author and title of this paper
    pub fn details(&self) -> PaperDetails {
        PaperDetails {
            author: self.author.clone(),
            title: self.title.clone(),
        }
    }

    /// Notification broadcast when this paper is registered
    pub fn event(&self) -> PaperEvent {
        PaperEvent {
            id: self.id,
            author: self.author.clone(),
            title: self.title.clone(),
            added_at: self.added_at,
        }
    }
}

/// Arguments of an add: everything a paper has except its identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaper {
    pub author: String,

    pub title: String,

    #[serde(default)]
    pub format: String,

    /// `None` means the caller sent no content at all, which is rejected.
    /// An empty byte sequence is valid content.
    #[serde(default)]
    pub content: Option<Vec<u8>>,
}

impl NewPaper {
    /// Create a new paper submission with content
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        format: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            format: format.into(),
            content: Some(content.into()),
        }
    }

    /// Check the submission before it touches the registry
    ///
    /// An author or title made only of whitespace counts as empty.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.author.trim().is_empty() {
            return Err(ServiceError::validation("author must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        if self.content.is_none() {
            return Err(ServiceError::validation("content is required"));
        }
        Ok(())
    }
}

/// Listing entry: `(id, author, title)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub id: u64,
    pub author: String,
    pub title: String,
}

/// Paper metadata returned by `GetPaperDetails`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDetails {
    pub author: String,
    pub title: String,
}

/// Derive a format tag from a file name: the lower-cased extension, or an
/// empty string when there is none.
pub fn format_from_path(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
