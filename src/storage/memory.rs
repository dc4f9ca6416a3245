//! 内存存储实现 / In-memory store implementations
//!
//! 默认进程内后端，同时支撑测试；生产部署换成平台数据库实现同一组trait
//! Default in-process backend, also used by the test suite; production swaps in
//! database-backed implementations of the same traits

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;

use super::traits::*;
use super::{GroupMessageRecord, GroupRecord, MessageRecord, NotificationRecord};
use crate::domain::model::Role;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 内存消息库 / In-memory message store
#[derive(Default)]
pub struct MemoryMessageStore {
    direct: RwLock<Vec<MessageRecord>>,
    group: RwLock<Vec<GroupMessageRecord>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direct_count(&self) -> usize {
        self.direct.read().len()
    }

    pub fn group_count(&self) -> usize {
        self.group.read().len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert_direct(
        &self,
        sender_id: &str,
        receiver_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<MessageRecord> {
        let rec = MessageRecord {
            id: new_id(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            body,
            attachment,
            is_read: false,
            created_at: now_ms(),
        };
        self.direct.write().push(rec.clone());
        Ok(rec)
    }

    async fn insert_group(
        &self,
        group_id: &str,
        sender_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<GroupMessageRecord> {
        let rec = GroupMessageRecord {
            id: new_id(),
            group_id: group_id.to_string(),
            sender_id: sender_id.to_string(),
            body,
            attachment,
            created_at: now_ms(),
        };
        self.group.write().push(rec.clone());
        Ok(rec)
    }

    async fn get_direct(&self, message_id: &str) -> Result<Option<MessageRecord>> {
        Ok(self.direct.read().iter().find(|m| m.id == message_id).cloned())
    }

    async fn get_group_message(&self, message_id: &str) -> Result<Option<GroupMessageRecord>> {
        Ok(self.group.read().iter().find(|m| m.id == message_id).cloned())
    }

    async fn update_direct_body(&self, message_id: &str, body: &str) -> Result<MessageRecord> {
        let mut rows = self.direct.write();
        let rec = rows
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| anyhow!("message {} not found", message_id))?;
        rec.body = Some(body.to_string());
        Ok(rec.clone())
    }

    async fn delete_direct(&self, message_id: &str) -> Result<()> {
        self.direct.write().retain(|m| m.id != message_id);
        Ok(())
    }

    async fn delete_group_message(&self, message_id: &str) -> Result<()> {
        self.group.write().retain(|m| m.id != message_id);
        Ok(())
    }

    async fn mark_thread_read(&self, receiver_id: &str, sender_id: &str) -> Result<usize> {
        let mut rows = self.direct.write();
        let mut flipped = 0usize;
        for rec in rows.iter_mut() {
            if rec.receiver_id == receiver_id && rec.sender_id == sender_id && !rec.is_read {
                rec.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}

/// 内存通知库 / In-memory notification store
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: RwLock<Vec<NotificationRecord>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_for(&self, recipient_id: &str) -> Vec<NotificationRecord> {
        self.rows
            .read()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(
        &self,
        recipient_id: &str,
        kind: &str,
        message: &str,
        data: serde_json::Value,
    ) -> Result<NotificationRecord> {
        let rec = NotificationRecord {
            id: new_id(),
            recipient_id: recipient_id.to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            data,
            is_read: false,
            created_at: now_ms(),
        };
        self.rows.write().push(rec.clone());
        Ok(rec)
    }

    async fn unread_count(&self, recipient_id: &str) -> Result<usize> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count())
    }
}

/// 内存群组库 / In-memory group store
#[derive(Default)]
pub struct MemoryGroupStore {
    groups: DashMap<String, GroupRecord>,
    members: DashMap<String, DashSet<String>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn create(&self, owner_id: &str, name: &str) -> Result<GroupRecord> {
        let rec = GroupRecord {
            id: new_id(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: now_ms(),
        };
        let set = DashSet::new();
        set.insert(owner_id.to_string());
        self.members.insert(rec.id.clone(), set);
        self.groups.insert(rec.id.clone(), rec.clone());
        Ok(rec)
    }

    async fn get(&self, group_id: &str) -> Result<Option<GroupRecord>> {
        Ok(self.groups.get(group_id).map(|g| g.clone()))
    }

    async fn delete(&self, group_id: &str) -> Result<()> {
        self.groups.remove(group_id);
        self.members.remove(group_id);
        Ok(())
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.members
            .get(group_id)
            .ok_or_else(|| anyhow!("group {} not found", group_id))?
            .insert(user_id.to_string());
        Ok(())
    }

    async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        if let Some(set) = self.members.get(group_id) {
            set.remove(user_id);
        }
        Ok(())
    }

    async fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .members
            .get(group_id)
            .map(|set| set.contains(user_id))
            .unwrap_or(false))
    }

    async fn members(&self, group_id: &str) -> Result<Vec<String>> {
        Ok(self
            .members
            .get(group_id)
            .map(|set| set.iter().map(|m| m.clone()).collect())
            .unwrap_or_default())
    }

    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .members
            .iter()
            .filter(|entry| entry.value().contains(user_id))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

/// 内存用户目录 / In-memory user directory
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserProfile>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册用户档案 / Seed a user profile
    pub fn seed(&self, id: &str, name: &str, role: Role, supervisor_id: Option<&str>) {
        self.users.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                name: name.to_string(),
                role,
                supervisor_id: supervisor_id.map(|s| s.to_string()),
            },
        );
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.users.contains_key(user_id))
    }

    async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.users.get(user_id).map(|u| u.name.clone()))
    }

    async fn admin_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == Role::Admin)
            .map(|u| u.id.clone())
            .collect())
    }

    async fn is_supervisee(&self, supervisor_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .users
            .get(user_id)
            .map(|u| u.supervisor_id.as_deref() == Some(supervisor_id))
            .unwrap_or(false))
    }
}

/// 内存附件存储：记录删除请求 / In-memory attachment store: records removal requests
#[derive(Default)]
pub struct MemoryAttachmentStore {
    removed: RwLock<Vec<String>>,
    pub fail_removals: std::sync::atomic::AtomicBool, // 注入删除失败 / Inject removal failures
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn removed_paths(&self) -> Vec<String> {
        self.removed.read().clone()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn remove(&self, path: &str) -> Result<()> {
        if self.fail_removals.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(anyhow!("attachment backend unavailable"));
        }
        self.removed.write().push(path.to_string());
        Ok(())
    }
}
