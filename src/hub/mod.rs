pub mod presence;
pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{AuthConfigLite, PushConfigLite, ServerConfig};
use crate::domain::event::{self, EventFrame, Outbound};
use crate::domain::model::Role;
use crate::service::auth::IdentityVerifier;
use crate::service::push::PushDelivery;
use crate::storage::{AttachmentStore, GroupStore, MessageStore, NotificationStore, UserStore};
use presence::PresenceRegistry;
use router::{group_channel, user_channel, RoomRouter};

/// 客户端连接信息 / Client Connection Information
///
/// 传输无关句柄：只要能消费Outbound通道即可承载（WebSocket/SSE/轮询）
/// Transport-agnostic handle: anything draining the Outbound channel can carry it
#[derive(Clone)]
pub struct Connection {
    pub conn_id: String,                         // 连接唯一ID / Connection unique ID
    pub user_id: String,                         // 用户ID / User ID
    pub role: Role,                              // 角色 / Role
    pub addr: SocketAddr,                        // 客户端地址 / Client address
    pub sender: mpsc::UnboundedSender<Outbound>, // 出站发送器 / Outbound sender
    pub connected_at: i64,                       // 接入时间（毫秒）/ Connected at (ms)
    pub last_heartbeat: Arc<parking_lot::Mutex<Instant>>, // 最后心跳 / Last heartbeat
}

/// 服务端全局状态 / Server Global State
///
/// 在线表与订阅表是仅有的共享可变状态，只经connect/disconnect与成员变更路径修改
/// The presence map and subscription tables are the only shared mutable state,
/// mutated exclusively through connect/disconnect and membership-change paths
#[derive(Clone)]
pub struct EduConnectServer {
    pub connections: Arc<DashMap<String, Connection>>, // 客户端连接 / Client connections
    pub presence: Arc<PresenceRegistry>,               // 在线注册表 / Presence registry
    pub router: Arc<RoomRouter>,                       // 房间路由 / Room router
    pub verifier: Arc<dyn IdentityVerifier>,           // 身份校验协作方 / Identity verifier
    pub push: Arc<dyn PushDelivery>,                   // 推送协作方 / Push collaborator
    pub messages: Arc<dyn MessageStore>,               // 消息库 / Message store
    pub notifications: Arc<dyn NotificationStore>,     // 通知库 / Notification store
    pub groups: Arc<dyn GroupStore>,                   // 群组库 / Group store
    pub users: Arc<dyn UserStore>,                     // 用户目录 / User directory
    pub attachments: Arc<dyn AttachmentStore>,         // 附件存储 / Attachment storage
    pub server_config: ServerConfig,                   // 服务配置 / Server config
    pub auth_config: AuthConfigLite,                   // 鉴权配置 / Auth config
    pub push_config: PushConfigLite,                   // 推送配置 / Push config
}

/// 组装所需的协作方集合 / Collaborator bundle for assembly
pub struct Collaborators {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub push: Arc<dyn PushDelivery>,
    pub messages: Arc<dyn MessageStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub groups: Arc<dyn GroupStore>,
    pub users: Arc<dyn UserStore>,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl EduConnectServer {
    /// 构建服务器实例 / Build server instance
    pub fn new(
        server_config: ServerConfig,
        auth_config: AuthConfigLite,
        push_config: PushConfigLite,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            presence: Arc::new(PresenceRegistry::new()),
            router: Arc::new(RoomRouter::new()),
            verifier: collaborators.verifier,
            push: collaborators.push,
            messages: collaborators.messages,
            notifications: collaborators.notifications,
            groups: collaborators.groups,
            users: collaborators.users,
            attachments: collaborators.attachments,
            server_config,
            auth_config,
            push_config,
        }
    }

    /// 配置路由器（注入骨干后的实例）/ Configure router (backbone-equipped instance)
    pub fn with_router(mut self, router: RoomRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// 鉴权成功后的会话接入 / Session join after successful authentication
    ///
    /// Authenticated→Joined 自动完成：个人频道 + 全部当前群频道 + 在线登记。
    /// bulkSync 只发给新接入连接；0→1跃迁时向全体广播presence.changed。
    /// Automatic Authenticated→Joined: personal channel, all current group
    /// channels, presence registration. bulkSync goes only to the joining
    /// connection; the 0→1 transition broadcasts presence.changed to everyone.
    pub async fn join_session(&self, conn: Connection) -> Result<()> {
        let conn_id = conn.conn_id.clone();
        let user_id = conn.user_id.clone();
        let sender = conn.sender.clone();

        // 可失败步骤在任何登记之前完成，失败不留半加入状态
        // The fallible step runs before any registration; a failure leaves no
        // half-joined state behind
        let group_ids = self.groups.groups_for_user(&user_id).await?;

        self.connections.insert(conn_id.clone(), conn);
        self.router.subscribe(&conn_id, &user_channel(&user_id));
        for group_id in &group_ids {
            self.router.subscribe(&conn_id, &group_channel(group_id));
        }

        let became_online = self.presence.connect(&user_id);
        let _ = sender.send(Outbound::Event(event::presence_bulk_sync(
            self.presence.online_user_ids(),
        )));
        if became_online {
            self.broadcast_all(event::presence_changed(&user_id, true));
        }
        info!("✅ Session joined: user={} conn={}", user_id, conn_id);
        Ok(())
    }

    /// 会话离开 / Session leave
    ///
    /// 任意关闭原因（显式close、网络故障、心跳超时）都走这一条路径
    /// Every close cause (explicit, network failure, heartbeat expiry) funnels here
    pub fn leave_session(&self, conn_id: &str) {
        if let Some((_, conn)) = self.connections.remove(conn_id) {
            self.router.drop_connection(conn_id);
            if self.presence.disconnect(&conn.user_id) {
                self.broadcast_all(event::presence_changed(&conn.user_id, false));
            }
            info!("👋 Session left: user={} conn={}", conn.user_id, conn_id);
        }
    }

    /// 向频道广播事件 / Broadcast an event to a channel
    ///
    /// 发射即忘：持久记录已存在，漏投靠客户端刷新恢复
    /// Fire-and-forget: the durable record already exists, a missed event is
    /// recoverable via client refresh
    pub fn emit_to_channel(&self, channel: &str, event: &EventFrame) {
        for conn_id in self.router.subscribers(channel) {
            if let Some(conn) = self.connections.get(&conn_id) {
                if conn.sender.send(Outbound::Event(event.clone())).is_err() {
                    debug!("stale subscriber {} on {}", conn_id, channel);
                }
            }
        }
        self.router.publish_remote(channel, event);
    }

    /// 向用户个人频道发射 / Emit to a user's personal channel
    pub fn emit_to_user(&self, user_id: &str, event: &EventFrame) {
        self.emit_to_channel(&user_channel(user_id), event);
    }

    /// 全局广播 / Global broadcast
    pub fn broadcast_all(&self, event: EventFrame) {
        for entry in self.connections.iter() {
            let _ = entry.value().sender.send(Outbound::Event(event.clone()));
        }
    }

    /// 将某用户的全部在线连接订阅到频道 / Subscribe all live connections of a user
    pub fn subscribe_user_live(&self, user_id: &str, channel: &str) {
        for entry in self.connections.iter() {
            if entry.value().user_id == user_id {
                self.router.subscribe(entry.key(), channel);
            }
        }
    }

    /// 将某用户的全部在线连接退订频道 / Unsubscribe all live connections of a user
    pub fn unsubscribe_user_live(&self, user_id: &str, channel: &str) {
        for entry in self.connections.iter() {
            if entry.value().user_id == user_id {
                self.router.unsubscribe(entry.key(), channel);
            }
        }
    }

    /// 刷新心跳 / Refresh heartbeat
    pub fn update_heartbeat(&self, conn_id: &str) {
        if let Some(conn) = self.connections.get(conn_id) {
            *conn.last_heartbeat.lock() = Instant::now();
        }
    }

    /// 清理心跳超时连接 / Clean up heartbeat-expired connections
    ///
    /// 中途凭证失效等异常会话最终由这里回收
    /// Sessions whose credentials went stale mid-flight are eventually reaped here
    pub fn cleanup_stale_connections(&self, timeout_ms: u64) {
        let stale: Vec<String> = self
            .connections
            .iter()
            .filter(|entry| {
                entry.value().last_heartbeat.lock().elapsed().as_millis() as u64 > timeout_ms
            })
            .map(|entry| entry.key().clone())
            .collect();
        for conn_id in stale {
            warn!("⏰ Connection {} timed out, disconnecting", conn_id);
            if let Some(conn) = self.connections.get(&conn_id) {
                let _ = conn.sender.send(Outbound::Close("heartbeat timeout".to_string()));
            }
            self.leave_session(&conn_id);
        }
    }
}
