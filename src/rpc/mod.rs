//! Remote procedure call layer.
//!
//! - [`protocol`]: line-delimited JSON frames and method payloads
//! - [`service`]: the four registry operations as typed calls
//! - [`methods`]: name → handler dispatch used by the server
//! - [`server`]: TCP accept loop, one task per connection
//! - [`client`]: typed client holding one connection

pub mod client;
pub mod methods;
pub mod protocol;
pub mod server;
pub mod service;

pub use client::PaperClient;
pub use methods::{MethodHandler, MethodRegistry};
pub use server::{PaperServer, PaperServerBuilder};
pub use service::PaperService;

/// Transport-level failures seen by a caller
///
/// Anything in here is fatal for the connection it happened on. Domain
/// errors are not transport failures; see [`ServiceError`](crate::models::ServiceError).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Socket read/write failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A line exceeded the frame size limit
    #[error("Frame exceeds {max} bytes")]
    FrameTooLong { max: usize },

    /// The peer closed the connection
    #[error("Connection closed by peer")]
    Closed,

    /// The server rejected the call (unknown method, malformed parameters)
    #[error("Server fault: {0}")]
    Fault(String),

    /// The peer sent a frame that makes no sense at this point
    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(String),
}

/// Server-side reasons a call cannot produce a reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error("Failed to encode reply: {0}")]
    Encode(String),
}
