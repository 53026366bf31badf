//! Core data models for registered papers and their notifications.

mod error;
mod event;
mod paper;

pub use error::{MethodResult, ServiceError};
pub use event::PaperEvent;
pub use paper::{format_from_path, NewPaper, Paper, PaperDetails, PaperSummary};
