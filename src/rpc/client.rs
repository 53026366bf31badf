//! Typed client for the paper methods.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;

use super::protocol::{
    method, write_frame, AddPaperReply, ClientFrame, FetchPaperContentReply, FrameReader,
    ListPapersReply, PaperIdParams, ServerFrame,
};
use super::RpcError;
use crate::models::{MethodResult, NewPaper, PaperDetails, PaperSummary};

#[derive(Debug)]
struct Connection {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

/// One RPC connection to a paper registry server
///
/// Calls made through the same client are serialized: each waits for its
/// reply before the next request is written, so they complete in the order
/// they were issued.
///
/// Every method returns `Result<MethodResult<T>, RpcError>`: the outer error
/// is a transport failure, the inner one a domain error reported by the
/// server.
#[derive(Debug)]
pub struct PaperClient {
    peer: SocketAddr,
    connection: Mutex<Connection>,
}

impl PaperClient {
    /// Connect to a server
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        tracing::debug!(%peer, "Connected to paper registry");

        Ok(Self {
            peer,
            connection: Mutex::new(Connection {
                reader: FrameReader::new(reader),
                writer,
                next_id: 0,
            }),
        })
    }

    /// Address of the server
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Call a method by name
    pub async fn call<P, T>(&self, method: &str, params: &P) -> Result<MethodResult<T>, RpcError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut conn = self.connection.lock().await;
        conn.next_id += 1;
        let id = conn.next_id;

        let frame = ClientFrame::Call {
            id,
            method: method.to_string(),
            params: serde_json::to_value(params)?,
        };
        write_frame(&mut conn.writer, &frame).await?;

        loop {
            match conn.reader.next_frame::<ServerFrame>().await? {
                None => return Err(RpcError::Closed),
                Some(ServerFrame::Reply { id: reply_id, result }) if reply_id == id => {
                    return Ok(serde_json::from_value(result)?);
                }
                Some(ServerFrame::Reply { id: stale, .. }) => {
                    // Left over from a call whose future was dropped
                    tracing::debug!(stale, expected = id, "Discarding stale reply");
                }
                Some(ServerFrame::Fault { id: Some(fault_id), .. }) if fault_id != id => {
                    tracing::debug!(fault_id, expected = id, "Discarding stale fault");
                }
                Some(ServerFrame::Fault { message, .. }) => return Err(RpcError::Fault(message)),
                Some(other) => return Err(RpcError::UnexpectedFrame(format!("{:?}", other))),
            }
        }
    }

    /// Register a paper, returning its identifier
    pub async fn add_paper(&self, paper: &NewPaper) -> Result<MethodResult<u64>, RpcError> {
        let reply: MethodResult<AddPaperReply> = self.call(method::ADD_PAPER, paper).await?;
        Ok(reply.map(|r| r.id))
    }

    /// List all papers in registration order
    pub async fn list_papers(&self) -> Result<MethodResult<Vec<PaperSummary>>, RpcError> {
        let reply: MethodResult<ListPapersReply> =
            self.call(method::LIST_PAPERS, &serde_json::Value::Null).await?;
        Ok(reply.map(|r| r.papers))
    }

    /// Author and title of a paper
    pub async fn get_paper_details(
        &self,
        id: u64,
    ) -> Result<MethodResult<PaperDetails>, RpcError> {
        self.call(method::GET_PAPER_DETAILS, &PaperIdParams { id })
            .await
    }

    /// Content of a paper
    pub async fn fetch_paper_content(&self, id: u64) -> Result<MethodResult<Vec<u8>>, RpcError> {
        let reply: MethodResult<FetchPaperContentReply> = self
            .call(method::FETCH_PAPER_CONTENT, &PaperIdParams { id })
            .await?;
        Ok(reply.map(|r| r.content))
    }
}
