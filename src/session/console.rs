//! The single owner of the session's output.
//!
//! The command loop and the notification listener both write through a
//! [`ConsoleHandle`]; one task drains the queue and writes to the terminal,
//! so lines from the two never interleave. A notification that arrives while
//! the prompt is on screen is printed on its own line and the prompt is
//! redrawn after it.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::SessionError;
use crate::models::PaperEvent;
use crate::ui::{self, Style};

const CONSOLE_QUEUE: usize = 256;

#[derive(Debug)]
enum ConsoleMessage {
    Line(String),
    Event(PaperEvent),
    Prompt,
}

/// Cloneable sender side of the console
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    queue: mpsc::Sender<ConsoleMessage>,
}

impl ConsoleHandle {
    /// Print one line
    pub async fn line(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(ConsoleMessage::Line(text.into())).await
    }

    /// Print several lines in one go
    pub async fn lines<I>(&self, lines: I) -> Result<(), SessionError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for line in lines {
            self.line(line).await?;
        }
        Ok(())
    }

    /// Print a new-paper notification
    pub async fn event(&self, event: PaperEvent) -> Result<(), SessionError> {
        self.send(ConsoleMessage::Event(event)).await
    }

    /// Show the command prompt
    pub async fn prompt(&self) -> Result<(), SessionError> {
        self.send(ConsoleMessage::Prompt).await
    }

    async fn send(&self, message: ConsoleMessage) -> Result<(), SessionError> {
        self.queue
            .send(message)
            .await
            .map_err(|_| SessionError::ConsoleClosed)
    }
}

/// Start the console task writing to `writer`
///
/// The task ends, flushing the writer, once every handle has been dropped.
pub fn spawn<W>(writer: W, style: Style) -> (ConsoleHandle, JoinHandle<std::io::Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (queue, receiver) = mpsc::channel(CONSOLE_QUEUE);
    let task = tokio::spawn(run_console(receiver, writer, style));
    (ConsoleHandle { queue }, task)
}

async fn run_console<W>(
    mut receiver: mpsc::Receiver<ConsoleMessage>,
    mut writer: W,
    style: Style,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut prompt_visible = false;

    while let Some(message) = receiver.recv().await {
        let text = match message {
            ConsoleMessage::Line(line) => {
                prompt_visible = false;
                format!("{}\n", line)
            }
            ConsoleMessage::Event(event) => {
                let line = ui::format_event(&event, style);
                if prompt_visible {
                    format!("\n{}\n{}", line, ui::PROMPT)
                } else {
                    format!("{}\n", line)
                }
            }
            ConsoleMessage::Prompt => {
                prompt_visible = true;
                ui::PROMPT.to_string()
            }
        };

        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
    }

    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event() -> PaperEvent {
        PaperEvent {
            id: 1,
            author: "Ada".to_string(),
            title: "Paper1".to_string(),
            added_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_redraws_visible_prompt() {
        let writer = tokio_test::io::Builder::new()
            .write(ui::PROMPT.as_bytes())
            .write(b"\nNew paper added: id: 1 Author: Ada Title: Paper1\n")
            .write(ui::PROMPT.as_bytes())
            .write(b"Paper added with ID: 1\n")
            .write(b"New paper added: id: 1 Author: Ada Title: Paper1\n")
            .build();

        let (console, task) = spawn(writer, Style::Plain);
        console.prompt().await.unwrap();
        console.event(event()).await.unwrap();
        console.line("Paper added with ID: 1").await.unwrap();
        console.event(event()).await.unwrap();
        drop(console);

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_send_after_console_stopped_fails() {
        let (console, task) = spawn(tokio::io::sink(), Style::Plain);
        task.abort();
        let _ = task.await;

        assert!(matches!(
            console.line("late").await,
            Err(SessionError::ConsoleClosed)
        ));
    }
}
