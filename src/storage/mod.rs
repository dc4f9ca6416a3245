//! 存储模块 - 数据结构定义与协作方契约
//! Storage Module - Data Structure Definitions and Collaborator Contracts
//!
//! 持久化协作方（消息库、通知库、群组库）由平台拥有，本核心只消费其CRUD原语
//! Persisted-state collaborators (message, notification, group stores) are owned
//! by the platform; this core only consumes their CRUD primitives

pub mod memory;
pub mod traits;

pub use traits::{AttachmentStore, GroupStore, MessageStore, NotificationStore, UserStore};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 私聊消息记录 / Direct message record
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: Option<String>,
    pub attachment: Option<String>,
    pub is_read: bool,
    pub created_at: i64,
}

/// 群聊消息记录 / Group message record
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageRecord {
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub body: Option<String>,
    pub attachment: Option<String>,
    pub created_at: i64,
}

/// 群组记录 / Group record
///
/// 群主不可变更，且永远是隐式成员 / Owner is immutable and always an implicit member
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: i64,
}

/// 通知记录 / Notification record
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: i64,
}
