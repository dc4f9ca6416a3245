//! 群组成员管理 / Group membership management
//!
//! 每次成员变更：(a) 立即更新受影响用户所有在线连接的订阅；
//! (b) 向剩余成员广播group.membersChanged；(c) 向受影响用户发定向事件。
//! Every membership mutation: (a) immediately updates subscriptions of all live
//! connections of affected users; (b) broadcasts group.membersChanged to the
//! remaining members; (c) sends a targeted event to the affected user.

use tracing::info;

use crate::domain::event;
use crate::domain::model::{Identity, Role};
use crate::error::HubError;
use crate::hub::router::group_channel;
use crate::hub::EduConnectServer;
use crate::storage::GroupRecord;

impl EduConnectServer {
    async fn owned_group(&self, actor: &Identity, group_id: &str) -> Result<GroupRecord, HubError> {
        let group = self
            .groups
            .get(group_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("group {} not found", group_id)))?;
        if group.owner_id != actor.id {
            return Err(HubError::Authorization(
                "only the group owner may manage this group".to_string(),
            ));
        }
        Ok(group)
    }

    async fn emit_members_changed(&self, group_id: &str) -> Result<(), HubError> {
        let members = self.groups.members(group_id).await?;
        self.emit_to_channel(
            &group_channel(group_id),
            &event::group_members_changed(group_id, members),
        );
        Ok(())
    }

    /// 建群（仅导师）/ Create a group (supervisor only)
    ///
    /// 创建者成为不可变更的群主并隐式入群 / Creator becomes the immutable owner and implicit member
    pub async fn create_group(
        &self,
        actor: &Identity,
        name: &str,
    ) -> Result<GroupRecord, HubError> {
        if actor.role != Role::Supervisor {
            return Err(HubError::Authorization(
                "only a supervisor may create a group".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(HubError::Validation("group name must not be empty".to_string()));
        }

        let group = self.groups.create(&actor.id, name.trim()).await?;
        self.subscribe_user_live(&actor.id, &group_channel(&group.id));
        info!("👥 Group {} created by {}", group.id, actor.id);
        Ok(group)
    }

    /// 添加成员（仅群主，候选人须隶属该导师）
    /// Add a member (owner only; candidate must belong to the owner's supervisee set)
    pub async fn add_group_member(
        &self,
        actor: &Identity,
        group_id: &str,
        user_id: &str,
    ) -> Result<(), HubError> {
        let group = self.owned_group(actor, group_id).await?;
        if !self.users.exists(user_id).await? {
            return Err(HubError::NotFound(format!("user {} not found", user_id)));
        }
        if !self.users.is_supervisee(&actor.id, user_id).await? {
            return Err(HubError::Authorization(
                "user is not in this supervisor's candidate set".to_string(),
            ));
        }
        if self.groups.is_member(group_id, user_id).await? {
            return Err(HubError::Validation("user is already a member".to_string()));
        }

        self.groups.add_member(group_id, user_id).await?;
        self.subscribe_user_live(user_id, &group_channel(group_id));
        self.emit_members_changed(group_id).await?;
        self.emit_to_user(user_id, &event::group_added(group_id, &group.name));
        info!("➕ {} added to group {}", user_id, group_id);
        Ok(())
    }

    /// 移除成员（仅群主，群主不可被移除）/ Remove a member (owner only; never the owner)
    pub async fn remove_group_member(
        &self,
        actor: &Identity,
        group_id: &str,
        user_id: &str,
    ) -> Result<(), HubError> {
        let group = self.owned_group(actor, group_id).await?;
        if user_id == group.owner_id {
            return Err(HubError::Authorization("the owner can never be removed".to_string()));
        }
        if !self.groups.is_member(group_id, user_id).await? {
            return Err(HubError::NotFound(format!(
                "user {} is not a member of group {}",
                user_id, group_id
            )));
        }

        self.groups.remove_member(group_id, user_id).await?;
        // 先退订再广播，被移除者不会收到membersChanged
        // Unsubscribe before broadcasting so the removed user misses membersChanged
        self.unsubscribe_user_live(user_id, &group_channel(group_id));
        self.emit_members_changed(group_id).await?;
        self.emit_to_user(user_id, &event::group_removed(group_id, &group.name));
        info!("➖ {} removed from group {}", user_id, group_id);
        Ok(())
    }

    /// 主动退群（非群主成员）/ Voluntary leave (any non-owner member)
    pub async fn leave_group(&self, actor: &Identity, group_id: &str) -> Result<(), HubError> {
        let group = self
            .groups
            .get(group_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("group {} not found", group_id)))?;
        if actor.id == group.owner_id {
            return Err(HubError::Authorization("the owner cannot leave the group".to_string()));
        }
        if !self.groups.is_member(group_id, &actor.id).await? {
            return Err(HubError::NotFound(format!(
                "user {} is not a member of group {}",
                actor.id, group_id
            )));
        }

        self.groups.remove_member(group_id, &actor.id).await?;
        self.unsubscribe_user_live(&actor.id, &group_channel(group_id));
        self.emit_members_changed(group_id).await?;
        self.emit_to_user(&actor.id, &event::group_left(group_id, &group.name));
        Ok(())
    }

    /// 删群（仅群主）/ Delete a group (owner only)
    pub async fn delete_group(&self, actor: &Identity, group_id: &str) -> Result<(), HubError> {
        self.owned_group(actor, group_id).await?;

        // 先通知再拆订阅 / Notify before tearing subscriptions down
        self.emit_to_channel(&group_channel(group_id), &event::group_deleted(group_id));
        self.router.remove_channel(&group_channel(group_id));
        self.groups.delete(group_id).await?;
        info!("🗑️  Group {} deleted by {}", group_id, actor.id);
        Ok(())
    }
}
