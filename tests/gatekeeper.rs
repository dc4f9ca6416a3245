//! 接入握手测试 / Connection handshake tests
//!
//! 经真实socket走完整的WebSocket握手路径 / Full WebSocket handshake path over real sockets

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use edu_connect_hub::config::{AuthConfigLite, PushConfigLite, ServerConfig};
use edu_connect_hub::domain::event::EventFrame;
use edu_connect_hub::domain::model::Role;
use edu_connect_hub::hub::{Collaborators, EduConnectServer};
use edu_connect_hub::service::auth::StaticIdentityVerifier;
use edu_connect_hub::service::push::NoopPushDelivery;
use edu_connect_hub::storage::memory::{
    MemoryAttachmentStore, MemoryGroupStore, MemoryMessageStore, MemoryNotificationStore,
    MemoryUserStore,
};
use edu_connect_hub::ws::connection::handle_connection;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 启动真实监听并返回地址 / Start a real listener and return its address
async fn start_server(auth_deadline_ms: u64) -> (EduConnectServer, Arc<StaticIdentityVerifier>, SocketAddr) {
    let verifier = Arc::new(StaticIdentityVerifier::new());
    let server = EduConnectServer::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            ws_port: 0,
            http_port: 0,
            timeout_ms: 60000,
            auth_deadline_ms,
        },
        AuthConfigLite { enabled: false, center_url: String::new(), timeout_ms: 1000 },
        PushConfigLite { url: None, timeout_ms: 1000, secret: None, enabled: false },
        Collaborators {
            verifier: verifier.clone(),
            push: Arc::new(NoopPushDelivery),
            messages: Arc::new(MemoryMessageStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            groups: Arc::new(MemoryGroupStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            attachments: Arc::new(MemoryAttachmentStore::new()),
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept_server = server.clone();
    tokio::spawn(async move {
        while let Ok((stream, peer)) = listener.accept().await {
            let server = accept_server.clone();
            tokio::spawn(async move {
                let _ = handle_connection(stream, peer, server).await;
            });
        }
    });
    (server, verifier, addr)
}

async fn dial(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws
}

/// 读下一帧（带超时）/ Read the next frame (with a timeout)
async fn next_message(ws: &mut WsClient) -> Message {
    tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("frame within 2s")
        .expect("stream still open")
        .unwrap()
}

fn parse_event(message: Message) -> EventFrame {
    match message {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

fn connect_frame(token: &str) -> Message {
    Message::Text(
        serde_json::json!({ "type": "connect", "data": { "token": token } }).to_string(),
    )
}

/// 等服务端异步收尾 / Let the server-side teardown finish
async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

fn assert_zero_state(server: &EduConnectServer, user_id: &str) {
    assert!(server.connections.is_empty(), "no registered connection");
    assert!(!server.presence.is_online(user_id), "no presence entry");
    assert!(server
        .router
        .subscribers(&format!("user:{}", user_id))
        .is_empty(), "no channel subscription");
}

#[tokio::test]
async fn valid_credential_joins_and_disconnect_cleans_up() {
    let (server, verifier, addr) = start_server(2000).await;
    verifier.issue("tok-alice", "alice", Role::Student);

    let mut ws = dial(addr).await;
    assert_eq!(parse_event(next_message(&mut ws).await).event_type, "connected");

    ws.send(connect_frame("tok-alice")).await.unwrap();

    // 加入期事件（bulkSync、上线广播）后必达auth.ok
    // Join-time events (bulkSync, online broadcast) precede auth.ok
    let mut seen = Vec::new();
    let auth_ok = loop {
        let frame = parse_event(next_message(&mut ws).await);
        if frame.event_type == "auth.ok" {
            break frame;
        }
        seen.push(frame.event_type.clone());
    };
    assert!(seen.iter().any(|t| t == "presence.bulkSync"));
    assert_eq!(auth_ok.data["userId"], "alice");
    assert!(server.presence.is_online("alice"));
    assert_eq!(server.connections.len(), 1);

    // 断开走统一清理通道 / Disconnect funnels through the one cleanup path
    ws.close(None).await.unwrap();
    settle().await;
    assert_zero_state(&server, "alice");
}

#[tokio::test]
async fn invalid_credential_is_rejected_with_zero_state() {
    let (server, _, addr) = start_server(2000).await;

    let mut ws = dial(addr).await;
    assert_eq!(parse_event(next_message(&mut ws).await).event_type, "connected");

    ws.send(connect_frame("bogus")).await.unwrap();
    let error = parse_event(next_message(&mut ws).await);
    assert_eq!(error.event_type, "error");
    assert!(matches!(next_message(&mut ws).await, Message::Close(_)));

    settle().await;
    assert_zero_state(&server, "alice");
}

#[tokio::test]
async fn malformed_first_frame_is_rejected_with_zero_state() {
    let (server, verifier, addr) = start_server(2000).await;
    verifier.issue("tok-alice", "alice", Role::Student);

    let mut ws = dial(addr).await;
    assert_eq!(parse_event(next_message(&mut ws).await).event_type, "connected");

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    let error = parse_event(next_message(&mut ws).await);
    assert_eq!(error.event_type, "error");
    assert!(matches!(next_message(&mut ws).await, Message::Close(_)));

    settle().await;
    assert_zero_state(&server, "alice");
}

#[tokio::test]
async fn handshake_window_expiry_closes_the_socket() {
    let (server, verifier, addr) = start_server(100).await;
    verifier.issue("tok-alice", "alice", Role::Student);

    let mut ws = dial(addr).await;
    assert_eq!(parse_event(next_message(&mut ws).await).event_type, "connected");

    // 不发connect帧，等窗口过期 / Send nothing and let the window expire
    assert!(matches!(next_message(&mut ws).await, Message::Close(_)));

    settle().await;
    assert_zero_state(&server, "alice");

    // 过期后的凭证提交无效 / A credential sent after expiry does nothing
    let _ = ws.send(connect_frame("tok-alice")).await;
    settle().await;
    assert_zero_state(&server, "alice");
}
