use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

use crate::domain::event::{ConnectRequest, EventFrame, Outbound};
use crate::hub::{Connection, EduConnectServer};

/// 处理新连接 / Handle new connection
///
/// 状态机：Connecting → Authenticated → Joined → Disconnected。
/// 鉴权须在握手窗口内完成，失败的连接在任何频道加入前被拒绝，不留下任何状态。
/// State machine: Connecting → Authenticated → Joined → Disconnected. Auth must
/// finish inside the handshake window; a rejected connection leaves zero state.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    server: EduConnectServer,
) -> Result<()> {
    tracing::info!("📨 New connection from: {}", peer_addr);

    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let conn_id = Uuid::new_v4().to_string();

    // 出站泵：序列化EventFrame，Close终止 / Outbound pump: serialize frames, Close terminates
    let conn_id_clone = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Event(frame) => {
                    let text = match serde_json::to_string(&frame) {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::error!("Failed to serialize frame for {}: {}", conn_id_clone, e);
                            continue;
                        }
                    };
                    if let Err(e) = ws_sender.send(Message::Text(text)).await {
                        tracing::error!("Failed to send to {}: {}", conn_id_clone, e);
                        break;
                    }
                }
                Outbound::Close(reason) => {
                    let _ = ws_sender
                        .send(Message::Close(Some(
                            tokio_tungstenite::tungstenite::protocol::CloseFrame {
                                code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::Normal,
                                reason: reason.into(),
                            },
                        )))
                        .await;
                    let _ = ws_sender.close().await;
                    break;
                }
            }
        }
    });

    let _ = tx.send(Outbound::Event(EventFrame::new(
        "connected",
        serde_json::json!({ "message": "awaiting credential" }),
    )));

    // Connecting → Authenticated：握手窗口内等待connect帧
    // Connecting → Authenticated: wait for the connect frame inside the window
    let deadline = Duration::from_millis(server.server_config.auth_deadline_ms);
    let identity = match tokio::time::timeout(deadline, ws_receiver.next()).await {
        Err(_) => {
            tracing::warn!("⏱️  Handshake window expired for {}", peer_addr);
            let _ = tx.send(Outbound::Close("authentication timeout".to_string()));
            return Ok(());
        }
        Ok(None) | Ok(Some(Err(_))) => {
            send_task.abort();
            return Ok(());
        }
        Ok(Some(Ok(first))) => match authenticate_frame(&server, first).await {
            Ok(identity) => identity,
            Err(reason) => {
                tracing::warn!("🚫 Rejected connection from {}: {}", peer_addr, reason);
                let _ = tx.send(Outbound::Event(EventFrame::new(
                    "error",
                    serde_json::json!({ "message": reason }),
                )));
                let _ = tx.send(Outbound::Close("authentication failed".to_string()));
                return Ok(());
            }
        },
    };

    // Authenticated → Joined：个人频道+群频道+在线登记
    // Authenticated → Joined: personal channel, group channels, presence
    let connection = Connection {
        conn_id: conn_id.clone(),
        user_id: identity.id.clone(),
        role: identity.role,
        addr: peer_addr,
        sender: tx.clone(),
        connected_at: chrono::Utc::now().timestamp_millis(),
        last_heartbeat: Arc::new(parking_lot::Mutex::new(Instant::now())),
    };
    server.join_session(connection).await?;
    let _ = tx.send(Outbound::Event(EventFrame::new(
        "auth.ok",
        serde_json::json!({ "userId": identity.id, "role": identity.role }),
    )));

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(message) => {
                if let Err(e) = handle_incoming(&server, message, &conn_id).await {
                    tracing::error!("Error handling message from {}: {}", conn_id, e);
                }
            }
            Err(e) => {
                tracing::error!("WebSocket error from {}: {}", conn_id, e);
                break;
            }
        }
    }

    // 任意原因断开都会走到这里 / Every disconnect cause reaches here
    server.leave_session(&conn_id);
    send_task.abort();
    Ok(())
}

/// 解析并校验握手帧 / Parse and verify the handshake frame
async fn authenticate_frame(
    server: &EduConnectServer,
    message: Message,
) -> Result<crate::domain::model::Identity, String> {
    let text = match message {
        Message::Text(t) => t,
        _ => return Err("handshake must be a text frame".to_string()),
    };
    let frame: EventFrame =
        serde_json::from_str(&text).map_err(|_| "malformed handshake frame".to_string())?;
    if frame.event_type != "connect" {
        return Err("first frame must be 'connect'".to_string());
    }
    let request: ConnectRequest =
        serde_json::from_value(frame.data).map_err(|_| "missing credential".to_string())?;
    server
        .verifier
        .verify(&request.token)
        .await
        .map_err(|e| e.to_string())
}

/// 处理进入消息（ping等会话级帧）/ Handle incoming session-level frames (ping etc.)
async fn handle_incoming(
    server: &EduConnectServer,
    message: Message,
    conn_id: &str,
) -> Result<()> {
    let text = match message {
        Message::Text(t) => t,
        _ => return Ok(()),
    };
    match serde_json::from_str::<EventFrame>(&text) {
        Ok(frame) => match frame.event_type.as_str() {
            "ping" => {
                tracing::debug!("🏓 Ping from {}", conn_id);
                server.update_heartbeat(conn_id);
                if let Some(conn) = server.connections.get(conn_id) {
                    let _ = conn.sender.send(Outbound::Event(EventFrame::new(
                        "pong",
                        serde_json::json!({
                            "timestamp": chrono::Utc::now().timestamp_millis(),
                        }),
                    )));
                }
            }
            other => {
                tracing::debug!("ignoring client frame '{}' from {}", other, conn_id);
            }
        },
        Err(_) => {
            if let Some(conn) = server.connections.get(conn_id) {
                let _ = conn.sender.send(Outbound::Event(EventFrame::new(
                    "error",
                    serde_json::json!({ "message": "invalid json" }),
                )));
            }
        }
    }
    Ok(())
}
