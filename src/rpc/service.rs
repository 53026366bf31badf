//! The registry operations as typed calls, plus the add notification trigger.

use std::sync::Arc;

use super::protocol::{AddPaperReply, FetchPaperContentReply, ListPapersReply};
use crate::events::EventPublisher;
use crate::models::{MethodResult, NewPaper, PaperDetails};
use crate::registry::PaperRegistry;

/// Registry operations exposed to remote callers
#[derive(Debug, Clone)]
pub struct PaperService {
    registry: Arc<PaperRegistry>,
    publisher: EventPublisher,
}

impl PaperService {
    pub fn new(registry: Arc<PaperRegistry>, publisher: EventPublisher) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    /// Register a paper and schedule its notification
    ///
    /// The notification is queued after the registry lock has been released
    /// and is never awaited.
    pub fn add_paper(&self, paper: NewPaper) -> MethodResult<AddPaperReply> {
        let paper = self.registry.add(paper)?;
        self.publisher.publish(paper.event());
        Ok(AddPaperReply { id: paper.id })
    }

    pub fn list_papers(&self) -> MethodResult<ListPapersReply> {
        Ok(ListPapersReply {
            papers: self.registry.list(),
        })
    }

    pub fn get_paper_details(&self, id: u64) -> MethodResult<PaperDetails> {
        self.registry.get_details(id)
    }

    pub fn fetch_paper_content(&self, id: u64) -> MethodResult<FetchPaperContentReply> {
        let content = self.registry.fetch_content(id)?;
        Ok(FetchPaperContentReply {
            content: content.to_vec(),
        })
    }
}
