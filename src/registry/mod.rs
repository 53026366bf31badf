//! The authoritative in-memory paper store.
//!
//! [`PaperRegistry`] is the only place identifiers are assigned. It is
//! constructed once per server and shared with the RPC layer behind an `Arc`.
//!
//! # Locking
//!
//! All state sits behind one reader/writer lock:
//!
//! - `list`, `get_details`, `fetch_content`, `get` and `last_id` take the read
//!   lock and may run in parallel with each other.
//! - `add` validates its arguments first, then takes the write lock only to
//!   assign the identifier and append the paper. Nothing else (logging,
//!   notification) happens while the write lock is held.
//!
//! Identifiers are dense and start at 1, so the paper with id `n` lives at
//! index `n - 1` and lookups never scan.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{NewPaper, Paper, PaperDetails, PaperSummary, ServiceError};

#[derive(Debug, Default)]
struct RegistryState {
    papers: Vec<Paper>,
    last_id: u64,
}

impl RegistryState {
    fn get(&self, id: u64) -> Option<&Paper> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.papers.get(index)
    }
}

/// Thread-safe registry of papers keyed by a monotonically assigned id
#[derive(Debug, Default)]
pub struct PaperRegistry {
    state: RwLock<RegistryState>,
}

impl PaperRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a paper and return it with its assigned identifier
    ///
    /// Rejected submissions never consume an identifier.
    pub fn add(&self, paper: NewPaper) -> Result<Paper, ServiceError> {
        paper.validate()?;

        let NewPaper {
            author,
            title,
            format,
            content,
        } = paper;
        let content: Arc<[u8]> = Arc::from(content.unwrap_or_default());

        let stored = {
            let mut state = self.state.write();
            state.last_id += 1;
            let paper = Paper {
                id: state.last_id,
                author,
                title,
                format,
                content,
                added_at: Utc::now(),
            };
            state.papers.push(paper.clone());
            paper
        };

        tracing::debug!(
            id = stored.id,
            author = %stored.author,
            title = %stored.title,
            format = %stored.format,
            bytes = stored.content.len(),
            "Registered paper"
        );

        Ok(stored)
    }

    /// Snapshot of all papers in insertion order, without content
    pub fn list(&self) -> Vec<PaperSummary> {
        self.state.read().papers.iter().map(Paper::summary).collect()
    }

    /// Author and title of a paper
    pub fn get_details(&self, id: u64) -> Result<PaperDetails, ServiceError> {
        self.state
            .read()
            .get(id)
            .map(Paper::details)
            .ok_or(ServiceError::NotFound { id })
    }

    /// Content of a paper
    pub fn fetch_content(&self, id: u64) -> Result<Arc<[u8]>, ServiceError> {
        self.state
            .read()
            .get(id)
            .map(|paper| Arc::clone(&paper.content))
            .ok_or(ServiceError::NotFound { id })
    }

    /// Full paper record, if registered
    pub fn get(&self, id: u64) -> Option<Paper> {
        self.state.read().get(id).cloned()
    }

    /// Highest identifier assigned so far (0 when empty)
    pub fn last_id(&self) -> u64 {
        self.state.read().last_id
    }

    /// Number of registered papers
    pub fn len(&self) -> usize {
        self.state.read().papers.len()
    }

    /// Check if no paper has been registered yet
    pub fn is_empty(&self) -> bool {
        self.state.read().papers.is_empty()
    }
}
