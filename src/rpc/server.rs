//! TCP server exposing the paper methods and the `paper_events` topic.
//!
//! Every accepted connection runs on its own task. Calls on one connection
//! are answered in order; a slow or stalled connection never holds anything
//! other connections need (the registry lock is only taken inside a call).

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::{JoinHandle, JoinSet};

use super::protocol::{write_frame, ClientFrame, FrameReader, ServerFrame};
use super::{MethodRegistry, PaperService, RpcError};
use crate::events::publisher::DEFAULT_QUEUE_CAPACITY;
use crate::events::topic::DEFAULT_SUBSCRIBER_CAPACITY;
use crate::events::{EventPublisher, Topic, PAPER_EVENTS_TOPIC};
use crate::registry::PaperRegistry;

/// Shared by every connection task
#[derive(Debug)]
struct ServerContext {
    methods: MethodRegistry,
    topic: Topic,
    registry: Arc<PaperRegistry>,
}

/// Builder for [`PaperServer`]
#[derive(Debug, Clone)]
pub struct PaperServerBuilder {
    queue_capacity: usize,
    subscriber_capacity: usize,
}

impl Default for PaperServerBuilder {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

impl PaperServerBuilder {
    /// Capacity of the publish queue between the RPC path and the worker
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Capacity of each subscriber's delivery queue
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    /// Bind the listener and start the publish worker
    pub async fn bind(self, addr: impl ToSocketAddrs) -> io::Result<PaperServer> {
        let listener = TcpListener::bind(addr).await?;

        let registry = Arc::new(PaperRegistry::new());
        let topic = Topic::new(PAPER_EVENTS_TOPIC, self.subscriber_capacity);
        let (publisher, publish_worker) = EventPublisher::spawn(topic.clone(), self.queue_capacity);
        let service = PaperService::new(Arc::clone(&registry), publisher);

        Ok(PaperServer {
            listener,
            context: Arc::new(ServerContext {
                methods: MethodRegistry::new(service),
                topic,
                registry,
            }),
            publish_worker,
        })
    }
}

/// The paper registry server
#[derive(Debug)]
pub struct PaperServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
    publish_worker: JoinHandle<()>,
}

impl PaperServer {
    pub fn builder() -> PaperServerBuilder {
        PaperServerBuilder::default()
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// On shutdown the listener is closed and every open connection,
    /// including subscriptions, is dropped. Pending notifications may be lost.
    pub async fn run<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let PaperServer {
            listener,
            context,
            publish_worker,
        } = self;

        tracing::info!("Paper registry listening on {}", listener.local_addr()?);

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "Accepted connection");
                        connections.spawn(serve_connection(stream, peer, Arc::clone(&context)));
                    }
                    Err(e) => tracing::warn!("Accept error: {}", e),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        tracing::info!(open = connections.len(), "Shutting down paper registry");
        drop(listener);
        connections.shutdown().await;
        publish_worker.abort();
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, context: Arc<ServerContext>) {
    match handle_connection(stream, &context).await {
        Ok(()) => tracing::debug!(%peer, "Connection closed"),
        Err(e) => tracing::debug!(%peer, "Connection dropped: {}", e),
    }
}

async fn handle_connection(stream: TcpStream, context: &ServerContext) -> Result<(), RpcError> {
    let (reader, mut writer) = stream.into_split();
    let mut frames = FrameReader::new(reader);

    loop {
        let frame = match frames.next_frame::<ClientFrame>().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(RpcError::Codec(e)) => {
                tracing::warn!("Undecodable frame: {}", e);
                let fault = ServerFrame::Fault {
                    id: None,
                    message: format!("Invalid frame: {}", e),
                };
                write_frame(&mut writer, &fault).await?;
                continue;
            }
            Err(e @ RpcError::FrameTooLong { .. }) => {
                tracing::warn!("Closing connection: {}", e);
                let fault = ServerFrame::Fault {
                    id: None,
                    message: e.to_string(),
                };
                write_frame(&mut writer, &fault).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        match frame {
            ClientFrame::Call { id, method, params } => {
                let reply = match context.methods.dispatch(&method, params).await {
                    Ok(result) => ServerFrame::Reply { id, result },
                    Err(fault) => {
                        tracing::warn!(id, method = %method, "Call failed: {}", fault);
                        ServerFrame::Fault {
                            id: Some(id),
                            message: fault.to_string(),
                        }
                    }
                };
                write_frame(&mut writer, &reply).await?;
            }
            ClientFrame::Subscribe { topic } => {
                return serve_subscription(topic, frames, writer, context).await;
            }
        }
    }
}

/// Forward topic events until either side goes away
async fn serve_subscription<R>(
    topic: String,
    mut frames: FrameReader<R>,
    mut writer: OwnedWriteHalf,
    context: &ServerContext,
) -> Result<(), RpcError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    if topic != context.topic.name() {
        let fault = ServerFrame::Fault {
            id: None,
            message: format!("Unknown topic: {}", topic),
        };
        return write_frame(&mut writer, &fault).await;
    }

    let mut subscriber = context
        .topic
        .subscribe_with(|| context.registry.last_id());
    tracing::debug!(
        topic = %topic,
        watermark = subscriber.watermark(),
        subscribers = context.topic.subscriber_count(),
        "Subscription established"
    );
    write_frame(&mut writer, &ServerFrame::Subscribed { topic: topic.clone() }).await?;

    loop {
        tokio::select! {
            event = subscriber.recv() => {
                let Some(event) = event else { return Ok(()) };
                let frame = ServerFrame::Event {
                    topic: topic.clone(),
                    event: (*event).clone(),
                };
                write_frame(&mut writer, &frame).await?;
            }
            incoming = frames.next_frame::<ClientFrame>() => match incoming {
                Ok(None) => return Ok(()),
                Ok(Some(frame)) => {
                    tracing::debug!(?frame, "Ignoring frame on subscription connection");
                }
                Err(RpcError::Codec(_)) => {}
                Err(e) => return Err(e),
            },
        }
    }
}
