//! Client end of a `paper_events` subscription.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use super::PAPER_EVENTS_TOPIC;
use crate::models::PaperEvent;
use crate::rpc::protocol::{write_frame, ClientFrame, FrameReader, ServerFrame};
use crate::rpc::RpcError;

/// A dedicated connection receiving new-paper notifications
///
/// Once [`connect`](Self::connect) returns, the subscription is live: every
/// paper added from then on is delivered (best-effort), and no paper added
/// before it ever is.
#[derive(Debug)]
pub struct EventSubscription {
    reader: FrameReader<OwnedReadHalf>,
    // Dropping the write half would signal end-of-stream to the server
    _writer: OwnedWriteHalf,
    topic: String,
}

impl EventSubscription {
    /// Subscribe to `paper_events`
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        Self::connect_to(addr, PAPER_EVENTS_TOPIC).await
    }

    /// Subscribe to a named topic
    pub async fn connect_to(addr: impl ToSocketAddrs, topic: &str) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = FrameReader::new(reader);

        write_frame(
            &mut writer,
            &ClientFrame::Subscribe {
                topic: topic.to_string(),
            },
        )
        .await?;

        match reader.next_frame::<ServerFrame>().await? {
            Some(ServerFrame::Subscribed { topic: confirmed }) if confirmed == topic => {
                tracing::debug!(topic, "Subscribed");
                Ok(Self {
                    reader,
                    _writer: writer,
                    topic: confirmed,
                })
            }
            Some(ServerFrame::Fault { message, .. }) => Err(RpcError::Fault(message)),
            Some(other) => Err(RpcError::UnexpectedFrame(format!("{:?}", other))),
            None => Err(RpcError::Closed),
        }
    }

    /// Wait for the next notification; `None` when the server closed the
    /// subscription
    pub async fn next_event(&mut self) -> Result<Option<PaperEvent>, RpcError> {
        loop {
            match self.reader.next_frame::<ServerFrame>().await? {
                None => return Ok(None),
                Some(ServerFrame::Event { topic, event }) if topic == self.topic => {
                    return Ok(Some(event));
                }
                Some(ServerFrame::Event { topic, .. }) => {
                    tracing::debug!(topic = %topic, "Ignoring event for another topic");
                }
                Some(ServerFrame::Fault { message, .. }) => return Err(RpcError::Fault(message)),
                Some(other) => return Err(RpcError::UnexpectedFrame(format!("{:?}", other))),
            }
        }
    }
}
