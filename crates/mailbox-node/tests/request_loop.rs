//! # Request Loop Tests
//!
//! The node runtime end to end: handles submit through the channel, the
//! single consumer runs the engine, and the JSON-lines frontend wraps it.

use mailbox_core::{
    BufferRef, MailboxKind, MailboxOperation, MailboxRequest, RetrieveScope, RESULT_OK,
};
use mailbox_node::{serve_lines, MailboxServer, NodeConfig, ServerError, ServerReply};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::time::timeout;

const ROOT_EP: u32 = 0;
const READER_EP: u32 = 5;

fn config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.server.identities = vec![(ROOT_EP, 0), (READER_EP, 5)];
    config
}

fn create_public(name: &str) -> MailboxOperation {
    MailboxOperation::CreateMailbox {
        name: name.into(),
        kind: MailboxKind::Public,
        send_list: String::new(),
        receive_list: String::new(),
        owner: None,
        delivery_model: None,
    }
}

#[tokio::test]
async fn test_requests_served_in_order() {
    let (server, handle) = MailboxServer::new(&config());
    let task = tokio::spawn(server.run());

    let response = handle
        .call(MailboxRequest::new(ROOT_EP, create_public("m")))
        .await
        .unwrap();
    assert_eq!(response.code, RESULT_OK);

    handle.transfer().write(ROOT_EP, 1, b"hello".to_vec());
    let deposit = MailboxOperation::DepositMessage {
        mailbox: "m".into(),
        body: BufferRef { handle: 1, len: 5 },
        subject: None,
        recipients: None,
    };
    assert!(handle.call(MailboxRequest::new(ROOT_EP, deposit)).await.unwrap().is_ok());

    let retrieve = MailboxOperation::RetrieveMessage {
        scope: RetrieveScope::Any,
        buffer: 9,
        capacity: 1024,
    };
    let response = handle
        .call(MailboxRequest::new(READER_EP, retrieve))
        .await
        .unwrap();
    assert_eq!(response.bytes_copied, 5);
    assert_eq!(handle.transfer().read(READER_EP, 9).unwrap(), b"hello");

    handle.shutdown();
    let served = timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(served, 3);
}

#[tokio::test]
async fn test_concurrent_clients_share_one_engine() {
    let (server, handle) = MailboxServer::new(&config());
    let task = tokio::spawn(server.run());

    let mut clients = Vec::new();
    for i in 0..8 {
        let handle = handle.clone();
        clients.push(tokio::spawn(async move {
            handle
                .call(MailboxRequest::new(ROOT_EP, create_public(&format!("box{}", i))))
                .await
                .unwrap()
                .code
        }));
    }
    for client in clients {
        assert_eq!(client.await.unwrap(), RESULT_OK);
    }

    // Same name again collides
    let response = handle
        .call(MailboxRequest::new(ROOT_EP, create_public("box3")))
        .await
        .unwrap();
    assert_eq!(response.code, -3);

    handle.shutdown();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_call_after_shutdown_fails() {
    let (server, handle) = MailboxServer::new(&config());
    let task = tokio::spawn(server.run());

    handle.shutdown();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();

    let result = handle.call(MailboxRequest::new(ROOT_EP, create_public("m"))).await;
    assert!(matches!(result, Err(ServerError::Stopped)));
}

#[tokio::test]
async fn test_late_binding() {
    let (server, handle) = MailboxServer::new(&config());
    let task = tokio::spawn(server.run());

    let remove = || MailboxRequest::new(42, MailboxOperation::RemoveUser { id: 3 });
    assert_eq!(handle.call(remove()).await.unwrap().code, -1);

    handle.bind(42, 0);
    // Superuser now, so the user is simply missing
    assert_eq!(handle.call(remove()).await.unwrap().code, -2);

    handle.shutdown();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_json_lines_frontend() {
    let (server, handle) = MailboxServer::new(&config());
    let task = tokio::spawn(server.run());

    let frames = [
        serde_json::json!({ "endpoint": ROOT_EP, "operation": create_public("m") }),
        serde_json::json!({
            "endpoint": ROOT_EP,
            "operation": MailboxOperation::DepositMessage {
                mailbox: "m".into(),
                body: BufferRef { handle: 1, len: 0 },
                subject: Some("s".into()),
                recipients: None,
            },
            "payload": "hi there",
        }),
        serde_json::json!({
            "endpoint": READER_EP,
            "operation": MailboxOperation::RetrieveMessage {
                scope: RetrieveScope::Named("m".into()),
                buffer: 2,
                capacity: 1024,
            },
        }),
    ];
    let mut input = String::new();
    for frame in &frames {
        input.push_str(&frame.to_string());
        input.push('\n');
    }
    input.push_str("not json\n");

    let mut output = Vec::new();
    let handled = serve_lines(&handle, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();
    assert_eq!(handled, 4);

    let replies: Vec<ServerReply> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(replies[0].response.as_ref().unwrap().is_ok());
    assert!(replies[1].response.as_ref().unwrap().is_ok());
    assert_eq!(replies[2].payload.as_deref(), Some("hi there"));
    assert!(replies[3].response.is_none());
    assert!(replies[3].error.is_some());

    // Staged deposit and retrieval buffers are both released
    assert!(handle.transfer().read(ROOT_EP, 1).is_none());
    assert!(handle.transfer().read(READER_EP, 2).is_none());

    handle.shutdown();
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}
