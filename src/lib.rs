//! # Paper Registry
//!
//! A concurrent, in-memory registry of papers exposed over a line-delimited
//! JSON RPC transport, with fanout notifications whenever a paper is added.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, NewPaper, PaperEvent, ServiceError)
//! - [`registry`]: The thread-safe paper store and identifier assignment
//! - [`rpc`]: Wire protocol, method dispatch, TCP server and typed client
//! - [`events`]: The `paper_events` fanout topic, publish worker and subscriptions
//! - [`session`]: Interactive client session (command loop + notification listener)
//! - [`ui`]: Terminal rendering of replies and notifications
//! - [`config`]: Configuration management

pub mod config;
pub mod events;
pub mod models;
pub mod registry;
pub mod rpc;
pub mod session;
pub mod ui;

// Re-export commonly used types
pub use events::{EventPublisher, EventSubscription, Topic, PAPER_EVENTS_TOPIC};
pub use models::{NewPaper, Paper, PaperEvent, ServiceError};
pub use registry::PaperRegistry;
pub use rpc::{PaperClient, PaperServer, RpcError};
pub use session::{Session, SessionError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
