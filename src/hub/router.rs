use dashmap::{DashMap, DashSet};
use std::sync::Arc;

use crate::domain::event::EventFrame;

/// 个人频道键 / Personal channel key
pub fn user_channel(user_id: &str) -> String {
    format!("user:{}", user_id)
}

/// 群频道键 / Group channel key
pub fn group_channel(group_id: &str) -> String {
    format!("group:{}", group_id)
}

/// 跨进程骨干（可插拔）/ Pluggable cross-process backbone
///
/// 单进程基线下为本地空实现；接入共享骨干时替换实现，调用方代码不变
/// No-op in the single-process baseline; swap the implementation for a shared
/// backbone without touching calling code
pub trait Backbone: Send + Sync {
    fn publish(&self, channel: &str, event: &EventFrame);
}

/// 本地骨干：进程内投递已直接完成 / Local backbone: in-process delivery is already direct
pub struct LocalBackbone;

impl Backbone for LocalBackbone {
    fn publish(&self, _channel: &str, _event: &EventFrame) {}
}

/// 房间路由器 / Room router
///
/// 连接到频道键集合的双向映射；广播前读取订阅者一致性快照。
/// 传输无关：只解析投递目标，不接触socket。
/// Bidirectional connection↔channel-key mapping; broadcast reads a consistent
/// subscriber snapshot. Transport-agnostic: resolves targets, never touches sockets.
pub struct RoomRouter {
    channels: DashMap<String, DashSet<String>>, // 频道 -> 连接 / channel -> conn_ids
    by_conn: DashMap<String, DashSet<String>>,  // 连接 -> 频道 / conn_id -> channels
    backbone: Arc<dyn Backbone>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            by_conn: DashMap::new(),
            backbone: Arc::new(LocalBackbone),
        }
    }

    pub fn with_backbone(mut self, backbone: Arc<dyn Backbone>) -> Self {
        self.backbone = backbone;
        self
    }

    pub fn subscribe(&self, conn_id: &str, channel: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.by_conn
            .entry(conn_id.to_string())
            .or_default()
            .insert(channel.to_string());
    }

    pub fn unsubscribe(&self, conn_id: &str, channel: &str) {
        if let Some(subs) = self.channels.get(channel) {
            subs.remove(conn_id);
        }
        if let Some(chans) = self.by_conn.get(conn_id) {
            chans.remove(channel);
        }
    }

    /// 连接关闭：移除其全部订阅 / Connection close: remove every subscription
    pub fn drop_connection(&self, conn_id: &str) {
        if let Some((_, chans)) = self.by_conn.remove(conn_id) {
            for channel in chans.iter() {
                if let Some(subs) = self.channels.get(channel.key()) {
                    subs.remove(conn_id);
                }
            }
        }
    }

    /// 整个频道下线（删群）/ Tear down a whole channel (group deletion)
    pub fn remove_channel(&self, channel: &str) {
        if let Some((_, subs)) = self.channels.remove(channel) {
            for conn_id in subs.iter() {
                if let Some(chans) = self.by_conn.get(conn_id.key()) {
                    chans.remove(channel);
                }
            }
        }
    }

    /// 订阅者快照 / Subscriber snapshot
    pub fn subscribers(&self, channel: &str) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|subs| subs.iter().map(|c| c.clone()).collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, conn_id: &str, channel: &str) -> bool {
        self.by_conn
            .get(conn_id)
            .map(|chans| chans.contains(channel))
            .unwrap_or(false)
    }

    /// 骨干转发钩子 / Backbone relay hook
    pub fn publish_remote(&self, channel: &str, event: &EventFrame) {
        self.backbone.publish(channel, event);
    }
}

impl Default for RoomRouter {
    fn default() -> Self {
        Self::new()
    }
}
