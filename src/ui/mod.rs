//! Terminal rendering for the interactive client.
//!
//! Everything here returns strings instead of printing: the session routes
//! all output through a single console writer, so rendering and writing are
//! kept apart. Colors are only applied when [`Style::Colored`] is requested.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::models::{PaperDetails, PaperEvent, PaperSummary, ServiceError};

/// Prompt shown while waiting for a command.
pub const PROMPT: &str = "Enter command (add, list, detail, fetch, exit): ";

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Output styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Colored,
}

impl Style {
    /// Colored when stdout is a terminal, plain otherwise.
    pub fn detect() -> Self {
        if is_terminal() {
            Style::Colored
        } else {
            Style::Plain
        }
    }

    pub fn is_colored(self) -> bool {
        self == Style::Colored
    }
}

/// Status types for message prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Info,
}

/// Status icons for different outcomes.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Info => "ℹ",
    }
}

fn with_status(status: Status, message: &str, style: Style) -> String {
    if !style.is_colored() {
        return message.to_string();
    }
    let icon = status_icon(status);
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), message),
        Status::Error => format!("{} {}", icon.red().bold(), message),
        Status::Info => format!("{} {}", icon.cyan().bold(), message),
    }
}

/// A new-paper notification.
pub fn format_event(event: &PaperEvent, style: Style) -> String {
    let text = format!(
        "New paper added: id: {} Author: {} Title: {}",
        event.id, event.author, event.title
    );
    if style.is_colored() {
        format!("{} {}", "◆".magenta().bold(), text.magenta())
    } else {
        text
    }
}

/// Reply to a successful add.
pub fn format_added(id: u64, style: Style) -> String {
    with_status(Status::Success, &format!("Paper added with ID: {}", id), style)
}

/// The paper listing, one line per paper.
pub fn format_paper_list(papers: &[PaperSummary], style: Style) -> Vec<String> {
    let header = if style.is_colored() {
        "Papers:".bold().to_string()
    } else {
        "Papers:".to_string()
    };

    std::iter::once(header)
        .chain(papers.iter().map(|p| {
            format!("ID: {}, Author: {}, Title: {}", p.id, p.author, p.title)
        }))
        .collect()
}

pub fn format_details(details: &PaperDetails) -> String {
    format!("Author: {}, Title: {}", details.author, details.title)
}

/// Paper content as text; invalid UTF-8 is replaced, not rejected.
pub fn format_content(content: &[u8]) -> String {
    String::from_utf8_lossy(content).into_owned()
}

/// A domain error reported by the server.
pub fn format_service_error(error: &ServiceError, style: Style) -> String {
    with_status(Status::Error, &error.to_string(), style)
}

/// A local problem (bad input, unreadable file).
pub fn format_error(message: &str, style: Style) -> String {
    with_status(Status::Error, message, style)
}

/// Connection banner printed when a session starts.
pub fn format_connected(addr: &str, style: Style) -> String {
    with_status(
        Status::Info,
        &format!("Connected to paper registry at {} (listening for new papers)", addr),
        style,
    )
}

pub fn help_text() -> &'static [&'static str] {
    &[
        "Commands:",
        "  add <author> <title> <file>   Register a paper from a local file",
        "  list                          List all papers",
        "  detail <id>                   Show the author and title of a paper",
        "  fetch <id>                    Print the content of a paper",
        "  help                          Show this help",
        "  exit                          Leave the session",
    ]
}
