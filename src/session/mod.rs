//! Interactive client session.
//!
//! A session holds one RPC connection and one `paper_events` subscription.
//! Two activities run side by side:
//!
//! - the command loop reads input lines and issues RPC calls;
//! - the listener task drains notifications.
//!
//! Neither waits for the other: the listener keeps printing notifications
//! while the command loop is blocked on input or on an RPC reply. All output
//! goes through one [`console`] task.
//!
//! Domain errors are printed and the session continues. A transport failure
//! on either connection ends the session with [`SessionError::Transport`].

pub mod command;
pub mod console;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::ToSocketAddrs;
use tokio::task::JoinHandle;

use crate::events::EventSubscription;
use crate::models::{format_from_path, NewPaper};
use crate::rpc::{PaperClient, RpcError};
use crate::ui::{self, Style};

pub use command::{Command, CommandError};
pub use console::ConsoleHandle;

/// Errors that end a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The RPC connection or the subscription failed
    #[error("Transport failure: {0}")]
    Transport(#[from] RpcError),

    /// Reading input or writing output failed
    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The console task is gone
    #[error("Console closed")]
    ConsoleClosed,

    /// The notification listener task panicked or was cancelled
    #[error("Notification listener failed: {0}")]
    Listener(String),
}

/// A connected client session
#[derive(Debug)]
pub struct Session {
    client: PaperClient,
    subscription: EventSubscription,
}

impl Session {
    /// Open the RPC connection and the subscription
    pub async fn connect<A>(addr: A) -> Result<Self, SessionError>
    where
        A: ToSocketAddrs + Clone,
    {
        let subscription = EventSubscription::connect(addr.clone()).await?;
        let client = PaperClient::connect(addr).await?;
        Ok(Self {
            client,
            subscription,
        })
    }

    /// Run the session until `exit`, end of input, or a transport failure
    pub async fn run<R, W>(self, input: R, output: W, style: Style) -> Result<(), SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Session {
            client,
            subscription,
        } = self;

        let (console, console_task) = console::spawn(output, style);
        console
            .line(ui::format_connected(&client.peer_addr().to_string(), style))
            .await?;

        let mut listener = tokio::spawn(listen(subscription, console.clone()));
        let result = command_loop(&client, input, &console, &mut listener, style).await;

        // The command loop may already have consumed the listener's output
        if !listener.is_finished() {
            listener.abort();
            let _ = listener.await;
        }
        drop(console);

        match console_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Console writer failed: {}", e),
            Err(e) => tracing::debug!("Console task failed: {}", e),
        }

        result
    }
}

/// Drain notifications into the console until the subscription ends
async fn listen(
    mut subscription: EventSubscription,
    console: ConsoleHandle,
) -> Result<(), SessionError> {
    loop {
        match subscription.next_event().await? {
            Some(event) => console.event(event).await?,
            None => return Err(SessionError::Transport(RpcError::Closed)),
        }
    }
}

async fn command_loop<R>(
    client: &PaperClient,
    input: R,
    console: &ConsoleHandle,
    listener: &mut JoinHandle<Result<(), SessionError>>,
    style: Style,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    loop {
        console.prompt().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            finished = &mut *listener => {
                let err = match finished {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => SessionError::Transport(RpcError::Closed),
                    Err(e) => SessionError::Listener(e.to_string()),
                };
                tracing::error!("Notification listener stopped: {}", err);
                return Err(err);
            }
        };

        let Some(line) = line else {
            tracing::debug!("End of input");
            return Ok(());
        };

        match Command::parse(&line) {
            None => continue,
            Some(Err(e)) => console.line(ui::format_error(&e.to_string(), style)).await?,
            Some(Ok(Command::Exit)) => return Ok(()),
            Some(Ok(command)) => execute(client, command, console, style).await?,
        }
    }
}

async fn execute(
    client: &PaperClient,
    command: Command,
    console: &ConsoleHandle,
    style: Style,
) -> Result<(), SessionError> {
    match command {
        Command::Add {
            author,
            title,
            file,
        } => {
            let content = match tokio::fs::read(&file).await {
                Ok(content) => content,
                Err(e) => {
                    let message = format!("Error reading file {}: {}", file.display(), e);
                    return console.line(ui::format_error(&message, style)).await;
                }
            };
            let paper = NewPaper::new(author, title, format_from_path(&file), content);
            match client.add_paper(&paper).await? {
                Ok(id) => console.line(ui::format_added(id, style)).await,
                Err(e) => console.line(ui::format_service_error(&e, style)).await,
            }
        }
        Command::List => match client.list_papers().await? {
            Ok(papers) => console.lines(ui::format_paper_list(&papers, style)).await,
            Err(e) => console.line(ui::format_service_error(&e, style)).await,
        },
        Command::Detail(id) => match client.get_paper_details(id).await? {
            Ok(details) => console.line(ui::format_details(&details)).await,
            Err(e) => console.line(ui::format_service_error(&e, style)).await,
        },
        Command::Fetch(id) => match client.fetch_paper_content(id).await? {
            Ok(content) => console.line(ui::format_content(&content)).await,
            Err(e) => console.line(ui::format_service_error(&e, style)).await,
        },
        Command::Help => {
            let lines: Vec<String> = ui::help_text().iter().map(|s| s.to_string()).collect();
            console.lines(lines).await
        }
        Command::Exit => Ok(()),
    }
}
