//! Integration tests for the paper registry
//!
//! Each test starts a server on an ephemeral port and talks to it over TCP
//! with the library client, exactly as the interactive session does.

use paper_registry::models::{PaperDetails, PaperSummary};
use paper_registry::{EventSubscription, NewPaper, PaperClient, PaperServer, RpcError, ServiceError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

async fn start_server() -> TestServer {
    let server = PaperServer::builder().bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown, signal) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run(async {
        let _ = signal.await;
    }));

    TestServer {
        addr,
        shutdown: Some(shutdown),
        handle,
    }
}

fn paper(author: &str, title: &str, content: &[u8]) -> NewPaper {
    NewPaper::new(author, title, "txt", content.to_vec())
}

async fn next_event(subscription: &mut EventSubscription) -> paper_registry::PaperEvent {
    tokio::time::timeout(Duration::from_secs(5), subscription.next_event())
        .await
        .expect("timed out waiting for a notification")
        .unwrap()
        .expect("subscription closed")
}

#[tokio::test]
async fn test_add_list_detail_fetch() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    let id = client
        .add_paper(&paper("Ada", "Paper1", &[0x41, 0x42]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, 1);

    let papers = client.list_papers().await.unwrap().unwrap();
    assert_eq!(
        papers,
        vec![PaperSummary {
            id: 1,
            author: "Ada".to_string(),
            title: "Paper1".to_string(),
        }]
    );

    let details = client.get_paper_details(1).await.unwrap().unwrap();
    assert_eq!(
        details,
        PaperDetails {
            author: "Ada".to_string(),
            title: "Paper1".to_string(),
        }
    );

    let content = client.fetch_paper_content(1).await.unwrap().unwrap();
    assert_eq!(content, vec![0x41, 0x42]);
    assert_eq!(
        client.fetch_paper_content(2).await.unwrap(),
        Err(ServiceError::NotFound { id: 2 })
    );

    server.stop().await;
}

#[tokio::test]
async fn test_list_is_empty_on_fresh_server() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    assert!(client.list_papers().await.unwrap().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_paper_is_rejected_and_not_stored() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    let result = client
        .add_paper(&paper("", "Untitled", b"x"))
        .await
        .unwrap();
    assert!(matches!(result, Err(ServiceError::Validation { .. })));

    let result = client
        .add_paper(&NewPaper {
            author: "Ada".to_string(),
            title: "No content".to_string(),
            format: String::new(),
            content: None,
        })
        .await
        .unwrap();
    assert!(matches!(result, Err(ServiceError::Validation { .. })));

    assert!(client.list_papers().await.unwrap().unwrap().is_empty());

    // Rejected adds do not consume identifiers
    let id = client
        .add_paper(&paper("Ada", "Paper1", b""))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    assert_eq!(
        client.get_paper_details(99).await.unwrap(),
        Err(ServiceError::NotFound { id: 99 })
    );
    assert_eq!(
        client.fetch_paper_content(0).await.unwrap(),
        Err(ServiceError::NotFound { id: 0 })
    );

    server.stop().await;
}

#[tokio::test]
async fn test_binary_content_is_preserved() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    let bytes: Vec<u8> = (0..=255u8).collect();
    let id = client
        .add_paper(&NewPaper::new("Ada", "Bytes", "bin", bytes.clone()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(client.fetch_paper_content(id).await.unwrap().unwrap(), bytes);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_get_distinct_dense_ids() {
    const CLIENTS: usize = 8;
    const PER_CLIENT: usize = 25;

    let server = start_server().await;

    let mut tasks = Vec::new();
    for c in 0..CLIENTS {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let client = PaperClient::connect(addr).await.unwrap();
            let mut ids = Vec::new();
            for i in 0..PER_CLIENT {
                let id = client
                    .add_paper(&paper(&format!("author{}", c), &format!("paper{}", i), b"x"))
                    .await
                    .unwrap()
                    .unwrap();
                ids.push(id);
            }
            ids
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        let client_ids = task.await.unwrap();
        // One client's adds are sequential, so its ids increase
        assert!(client_ids.windows(2).all(|w| w[0] < w[1]));
        ids.extend(client_ids);
    }
    ids.sort_unstable();
    let expected: Vec<u64> = (1..=(CLIENTS * PER_CLIENT) as u64).collect();
    assert_eq!(ids, expected);

    let client = PaperClient::connect(server.addr).await.unwrap();
    let listed: Vec<u64> = client
        .list_papers()
        .await
        .unwrap()
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(listed, expected);

    server.stop().await;
}

#[tokio::test]
async fn test_every_subscriber_gets_each_notification() {
    let server = start_server().await;
    let mut first = EventSubscription::connect(server.addr).await.unwrap();
    let mut second = EventSubscription::connect(server.addr).await.unwrap();
    let client = PaperClient::connect(server.addr).await.unwrap();

    client
        .add_paper(&paper("Ada", "Paper1", b"hello"))
        .await
        .unwrap()
        .unwrap();

    for subscription in [&mut first, &mut second] {
        let event = next_event(subscription).await;
        assert_eq!(event.id, 1);
        assert_eq!(event.author, "Ada");
        assert_eq!(event.title, "Paper1");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_late_subscriber_does_not_see_earlier_papers() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    client
        .add_paper(&paper("Ada", "Paper1", b"one"))
        .await
        .unwrap()
        .unwrap();

    let mut subscription = EventSubscription::connect(server.addr).await.unwrap();

    client
        .add_paper(&paper("Grace", "Paper2", b"two"))
        .await
        .unwrap()
        .unwrap();

    let event = next_event(&mut subscription).await;
    assert_eq!(event.id, 2);
    assert_eq!(event.author, "Grace");

    server.stop().await;
}

#[tokio::test]
async fn test_notifications_arrive_in_id_order() {
    let server = start_server().await;
    let mut subscription = EventSubscription::connect(server.addr).await.unwrap();
    let client = PaperClient::connect(server.addr).await.unwrap();

    for i in 0..5 {
        client
            .add_paper(&paper("Ada", &format!("Paper{}", i), b"x"))
            .await
            .unwrap()
            .unwrap();
    }

    for expected in 1..=5 {
        assert_eq!(next_event(&mut subscription).await.id, expected);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_topic_is_refused() {
    let server = start_server().await;

    let result = EventSubscription::connect_to(server.addr, "weather").await;
    assert!(matches!(result, Err(RpcError::Fault(_))));

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_method_faults_and_connection_survives() {
    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    let result = client
        .call::<_, serde_json::Value>("DeletePaper", &serde_json::json!({ "id": 1 }))
        .await;
    match result {
        Err(RpcError::Fault(message)) => assert!(message.contains("DeletePaper")),
        other => panic!("expected a fault, got {:?}", other),
    }

    assert!(client.list_papers().await.unwrap().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_subscription_ends_when_server_stops() {
    let server = start_server().await;
    let mut subscription = EventSubscription::connect(server.addr).await.unwrap();

    server.stop().await;

    let result = tokio::time::timeout(Duration::from_secs(5), subscription.next_event())
        .await
        .expect("subscription did not notice the shutdown");
    assert!(matches!(result, Ok(None) | Err(RpcError::Io(_))));
}

#[tokio::test]
async fn test_oversized_frame_closes_only_that_connection() {
    use paper_registry::rpc::protocol::{FrameReader, ServerFrame, MAX_FRAME_LENGTH};
    use tokio::io::AsyncWriteExt;

    let server = start_server().await;
    let client = PaperClient::connect(server.addr).await.unwrap();

    let stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let flood = tokio::spawn(async move {
        let _ = writer.write_all(&vec![b'x'; MAX_FRAME_LENGTH + 1]).await;
        writer
    });

    let mut frames = FrameReader::new(reader);
    let reply = tokio::time::timeout(Duration::from_secs(10), frames.next_frame::<ServerFrame>())
        .await
        .expect("no reply to an oversized frame")
        .unwrap();
    match reply {
        Some(ServerFrame::Fault { id: None, message }) => assert!(message.contains("exceeds")),
        other => panic!("expected a fault, got {:?}", other),
    }
    assert!(matches!(
        frames.next_frame::<ServerFrame>().await,
        Ok(None) | Err(RpcError::Io(_))
    ));
    drop(flood.await.unwrap());

    // Other connections and the registry are untouched
    let id = client
        .add_paper(&paper("Ada", "Paper1", b"x"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, 1);

    server.stop().await;
}
