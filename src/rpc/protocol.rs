//! Wire protocol: one JSON frame per line in each direction.
//!
//! A connection either carries calls (`call` → `reply` / `fault`) or, after a
//! `subscribe` frame, becomes a one-way stream of `event` frames.
//!
//! Domain errors never appear as `fault`: they are encoded inside
//! `reply.result` as `{"Err": {"kind": ...}}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use super::RpcError;
use crate::models::{PaperEvent, PaperSummary};

/// Remote method names
pub mod method {
    pub const ADD_PAPER: &str = "AddPaper";
    pub const LIST_PAPERS: &str = "ListPapers";
    pub const GET_PAPER_DETAILS: &str = "GetPaperDetails";
    pub const FETCH_PAPER_CONTENT: &str = "FetchPaperContent";
}

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Invoke a remote method
    Call {
        id: u64,
        method: String,
        #[serde(default)]
        params: Value,
    },

    /// Turn this connection into a subscription on `topic`
    Subscribe { topic: String },
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Method completed; `result` is a serialized `MethodResult`
    Reply { id: u64, result: Value },

    /// The call (or an undecodable frame, `id: null`) could not be processed
    Fault { id: Option<u64>, message: String },

    /// Subscription established
    Subscribed { topic: String },

    /// A notification on a subscribed topic
    Event { topic: String, event: PaperEvent },
}

/// Parameters of `AddPaper` are [`NewPaper`](crate::models::NewPaper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPaperReply {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPapersReply {
    pub papers: Vec<PaperSummary>,
}

/// Parameters of `GetPaperDetails` and `FetchPaperContent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperIdParams {
    pub id: u64,
}

/// Reply of `GetPaperDetails` is [`PaperDetails`](crate::models::PaperDetails)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPaperContentReply {
    pub content: Vec<u8>,
}

/// Longest line accepted from a peer, newline excluded
///
/// Paper content travels as a JSON array of integers, so this bounds a
/// single paper to a few megabytes.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Reads newline-delimited JSON frames
#[derive(Debug)]
pub struct FrameReader<R> {
    lines: FramedRead<R, LinesCodec>,
    max_length: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_length(reader, MAX_FRAME_LENGTH)
    }

    pub fn with_max_length(reader: R, max_length: usize) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(max_length)),
            max_length,
        }
    }

    /// Next frame, or `None` at end of stream
    ///
    /// Blank lines are skipped. A line that is not a valid frame yields
    /// [`RpcError::Codec`]; the stream stays usable afterwards. A line longer
    /// than the limit yields [`RpcError::FrameTooLong`] as soon as the limit
    /// is crossed, without buffering the rest of it. Cancel safe.
    pub async fn next_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>, RpcError> {
        loop {
            let line = match self.lines.next().await {
                None => return Ok(None),
                Some(Ok(line)) => line,
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    return Err(RpcError::FrameTooLong {
                        max: self.max_length,
                    })
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(RpcError::Io(e)),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(&line)?));
        }
    }
}

/// Write one frame followed by a newline and flush
pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(frame)?;
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_frame_shape() {
        let frame = ClientFrame::Call {
            id: 3,
            method: method::GET_PAPER_DETAILS.to_string(),
            params: json!({ "id": 1 }),
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({ "type": "call", "id": 3, "method": "GetPaperDetails", "params": { "id": 1 } })
        );
    }

    #[test]
    fn test_call_without_params_defaults_to_null() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"call","id":1,"method":"ListPapers"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Call {
                id: 1,
                method: "ListPapers".to_string(),
                params: Value::Null,
            }
        );
    }

    #[test]
    fn test_fault_frame_allows_null_id() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"fault","id":null,"message":"bad frame"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Fault {
                id: None,
                message: "bad frame".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_reader_skips_blank_lines_and_reports_garbage() {
        let input: &[u8] = b"\n{\"type\":\"subscribe\",\"topic\":\"paper_events\"}\nnot json\n";
        let mut reader = FrameReader::new(input);

        let frame: Option<ClientFrame> = reader.next_frame().await.unwrap();
        assert_eq!(
            frame,
            Some(ClientFrame::Subscribe {
                topic: "paper_events".to_string()
            })
        );

        let garbage = reader.next_frame::<ClientFrame>().await;
        assert!(matches!(garbage, Err(RpcError::Codec(_))));

        let end = reader.next_frame::<ClientFrame>().await.unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_reader_stops_at_oversized_line() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = FrameReader::with_max_length(server, 64);

        // Far more than the limit and no newline: the reader must give up
        // while the writer is still blocked on the full pipe
        let writer = tokio::spawn(async move {
            let chunk = [b'x'; 256];
            for _ in 0..1024 {
                if client.write_all(&chunk).await.is_err() {
                    return false;
                }
            }
            true
        });

        let result = reader.next_frame::<ClientFrame>().await;
        assert!(matches!(result, Err(RpcError::FrameTooLong { max: 64 })));

        drop(reader);
        assert!(!writer.await.unwrap(), "the whole line was buffered");
    }

    #[tokio::test]
    async fn test_write_frame_appends_newline() {
        let mut writer = tokio_test::io::Builder::new()
            .write(b"{\"type\":\"subscribed\",\"topic\":\"paper_events\"}\n")
            .build();

        write_frame(
            &mut writer,
            &ServerFrame::Subscribed {
                topic: "paper_events".to_string(),
            },
        )
        .await
        .unwrap();
    }
}
