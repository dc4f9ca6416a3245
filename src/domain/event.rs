use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storage::{GroupMessageRecord, MessageRecord, NotificationRecord};

/// 事件帧 / Event frame
///
/// 双向线格式：服务端事件和客户端请求共用同一信封
/// Bidirectional wire format: server events and client requests share one envelope
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

impl EventFrame {
    pub fn new(event_type: &str, data: impl Serialize) -> Self {
        Self {
            event_type: event_type.to_string(),
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// 出站消息 / Outbound message
///
/// 连接句柄承载的传输无关单元；关闭指令与事件走同一通道
/// Transport-agnostic unit carried by a connection handle; close control shares the channel
#[derive(Debug, Clone)]
pub enum Outbound {
    Event(EventFrame),
    Close(String),
}

/// 客户端握手请求 / Client handshake request
#[derive(Serialize, Deserialize, Debug, JsonSchema)]
pub struct ConnectRequest {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChanged {
    pub user_id: String,
    pub online: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceBulkSync {
    pub online_user_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRead {
    pub reader_id: String,
    pub partner_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembersChanged {
    pub group_id: String,
    pub member_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupTargeted {
    pub group_id: String,
    pub group_name: String,
}

/// 群消息载荷，附带展示名 / Group message payload with resolved display name
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessagePayload {
    #[serde(flatten)]
    pub message: GroupMessageRecord,
    pub sender_name: String,
}

pub fn presence_changed(user_id: &str, online: bool) -> EventFrame {
    EventFrame::new(
        "presence.changed",
        PresenceChanged { user_id: user_id.to_string(), online },
    )
}

pub fn presence_bulk_sync(online_user_ids: Vec<String>) -> EventFrame {
    EventFrame::new("presence.bulkSync", PresenceBulkSync { online_user_ids })
}

pub fn message_new(message: &MessageRecord) -> EventFrame {
    EventFrame::new("message.new", message)
}

pub fn message_updated(message: &MessageRecord) -> EventFrame {
    EventFrame::new("message.updated", message)
}

pub fn message_deleted(message_id: &str) -> EventFrame {
    EventFrame::new("message.deleted", serde_json::json!({ "id": message_id }))
}

pub fn message_thread_read(reader_id: &str, partner_id: &str) -> EventFrame {
    EventFrame::new(
        "message.threadRead",
        ThreadRead { reader_id: reader_id.to_string(), partner_id: partner_id.to_string() },
    )
}

pub fn group_new_message(message: &GroupMessageRecord, sender_name: &str) -> EventFrame {
    EventFrame::new(
        "group.newMessage",
        GroupMessagePayload { message: message.clone(), sender_name: sender_name.to_string() },
    )
}

pub fn group_message_deleted(message_id: &str, group_id: &str) -> EventFrame {
    EventFrame::new(
        "group.messageDeleted",
        serde_json::json!({ "id": message_id, "groupId": group_id }),
    )
}

pub fn group_members_changed(group_id: &str, member_ids: Vec<String>) -> EventFrame {
    EventFrame::new(
        "group.membersChanged",
        MembersChanged { group_id: group_id.to_string(), member_ids },
    )
}

pub fn group_deleted(group_id: &str) -> EventFrame {
    EventFrame::new("group.deleted", serde_json::json!({ "groupId": group_id }))
}

pub fn group_added(group_id: &str, group_name: &str) -> EventFrame {
    EventFrame::new(
        "group.added",
        GroupTargeted { group_id: group_id.to_string(), group_name: group_name.to_string() },
    )
}

pub fn group_removed(group_id: &str, group_name: &str) -> EventFrame {
    EventFrame::new(
        "group.removed",
        GroupTargeted { group_id: group_id.to_string(), group_name: group_name.to_string() },
    )
}

pub fn group_left(group_id: &str, group_name: &str) -> EventFrame {
    EventFrame::new(
        "group.left",
        GroupTargeted { group_id: group_id.to_string(), group_name: group_name.to_string() },
    )
}

pub fn notification_new(notification: &NotificationRecord) -> EventFrame {
    EventFrame::new("notification.new", notification)
}
