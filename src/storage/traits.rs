use anyhow::Result;
use async_trait::async_trait;

use super::{GroupMessageRecord, GroupRecord, MessageRecord, NotificationRecord};
use crate::domain::model::Role;

/// 消息库 / Message store
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_direct(
        &self,
        sender_id: &str,
        receiver_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<MessageRecord>;

    async fn insert_group(
        &self,
        group_id: &str,
        sender_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<GroupMessageRecord>;

    async fn get_direct(&self, message_id: &str) -> Result<Option<MessageRecord>>;
    async fn get_group_message(&self, message_id: &str) -> Result<Option<GroupMessageRecord>>;

    async fn update_direct_body(&self, message_id: &str, body: &str) -> Result<MessageRecord>;
    async fn delete_direct(&self, message_id: &str) -> Result<()>;
    async fn delete_group_message(&self, message_id: &str) -> Result<()>;

    /// 批量已读：将指定发送者发给receiver的所有未读消息置为已读，返回翻转行数
    /// Bulk read-marking: flips every unread message from sender to receiver, returns rows changed
    async fn mark_thread_read(&self, receiver_id: &str, sender_id: &str) -> Result<usize>;
}

/// 通知库 / Notification store
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(
        &self,
        recipient_id: &str,
        kind: &str,
        message: &str,
        data: serde_json::Value,
    ) -> Result<NotificationRecord>;

    async fn unread_count(&self, recipient_id: &str) -> Result<usize>;
}

/// 群组/成员库 / Group and membership store
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// 建群并将群主写入成员集 / Creates the group and seeds the owner into the member set
    async fn create(&self, owner_id: &str, name: &str) -> Result<GroupRecord>;
    async fn get(&self, group_id: &str) -> Result<Option<GroupRecord>>;
    async fn delete(&self, group_id: &str) -> Result<()>;

    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<()>;
    async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<()>;
    async fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool>;
    async fn members(&self, group_id: &str) -> Result<Vec<String>>;
    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<String>>;
}

/// 用户目录 / User directory
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists(&self, user_id: &str) -> Result<bool>;
    async fn display_name(&self, user_id: &str) -> Result<Option<String>>;
    async fn admin_ids(&self) -> Result<Vec<String>>;

    /// 候选集：用户是否隶属于该导师 / Candidate set: is the user supervised by this supervisor
    async fn is_supervisee(&self, supervisor_id: &str, user_id: &str) -> Result<bool>;
}

/// 附件存储协作方 / Attachment storage collaborator
///
/// 删除是尽力而为的副作用 / Removal is a best-effort side effect
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn remove(&self, path: &str) -> Result<()>;
}

/// 用户档案（内存实现与测试共用）/ User profile (shared by memory impl and tests)
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub supervisor_id: Option<String>,
}
