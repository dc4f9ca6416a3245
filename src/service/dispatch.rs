//! 消息分发 / Message dispatch
//!
//! 持久化与广播是两个独立步骤：先落库成功，后发射事件；落库失败则整个操作失败、
//! 不发射任何事件。发射经无界通道完成，不阻塞响应路径。
//! Persistence and broadcast are two distinct steps: persist first, emit after;
//! a persistence failure fails the whole operation with nothing emitted.
//! Emission goes through unbounded channels and never blocks the response path.

use tracing::{info, warn};

use crate::domain::event;
use crate::domain::model::{Identity, RecipientSet};
use crate::error::HubError;
use crate::hub::router::group_channel;
use crate::hub::EduConnectServer;
use crate::storage::{GroupMessageRecord, MessageRecord};

/// 统一内容策略：正文或附件至少其一 / One consistent policy: at least one of body/attachment
fn validate_content(
    body: &Option<String>,
    attachment: &Option<String>,
) -> Result<(), HubError> {
    let has_body = body.as_deref().map(|b| !b.trim().is_empty()).unwrap_or(false);
    let has_attachment = attachment.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false);
    if !has_body && !has_attachment {
        return Err(HubError::Validation(
            "message requires a body or an attachment".to_string(),
        ));
    }
    Ok(())
}

/// 通知正文预览 / Notification body preview
fn preview(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .unwrap_or("[attachment]")
        .to_string()
}

impl EduConnectServer {
    /// 发送私聊消息 / Send a direct message
    ///
    /// 落库成功后：回显到发送者个人频道（其它会话同步）、投递到接收者个人频道，
    /// 并为接收者扇出一条通知。接收者是否在线不影响落库结果。
    /// After persistence: echo to the sender's personal channel, deliver to the
    /// recipient's, fan out one notification. Recipient presence never affects
    /// persistence success.
    pub async fn send_direct_message(
        &self,
        actor: &Identity,
        receiver_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<MessageRecord, HubError> {
        validate_content(&body, &attachment)?;
        if !self.users.exists(receiver_id).await? {
            return Err(HubError::NotFound(format!("recipient {} not found", receiver_id)));
        }

        let record = self
            .messages
            .insert_direct(&actor.id, receiver_id, body, attachment)
            .await?;

        let frame = event::message_new(&record);
        self.emit_to_user(&actor.id, &frame);
        self.emit_to_user(receiver_id, &frame);

        self.fan_out(
            &actor.id,
            RecipientSet::User(receiver_id.to_string()),
            "message.direct",
            &preview(&record.body),
            serde_json::json!({ "route": "chat", "senderId": actor.id, "messageId": record.id }),
        )
        .await?;

        info!("📨 Direct message {} persisted: {} -> {}", record.id, actor.id, receiver_id);
        Ok(record)
    }

    /// 发送群消息 / Send a group message
    ///
    /// 发送者必须是当前成员；群频道投递已含发送者会话
    /// Sender must be a current member; the group channel already reaches the
    /// sender's own sessions
    pub async fn send_group_message(
        &self,
        actor: &Identity,
        group_id: &str,
        body: Option<String>,
        attachment: Option<String>,
    ) -> Result<GroupMessageRecord, HubError> {
        validate_content(&body, &attachment)?;
        let group = self
            .groups
            .get(group_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("group {} not found", group_id)))?;
        if !self.groups.is_member(group_id, &actor.id).await? {
            return Err(HubError::Authorization(
                "sender is not a member of this group".to_string(),
            ));
        }

        let record = self
            .messages
            .insert_group(group_id, &actor.id, body, attachment)
            .await?;
        let sender_name = self
            .users
            .display_name(&actor.id)
            .await?
            .unwrap_or_else(|| actor.id.clone());

        self.emit_to_channel(&group_channel(group_id), &event::group_new_message(&record, &sender_name));

        self.fan_out(
            &actor.id,
            RecipientSet::GroupMembers(group_id.to_string()),
            "message.group",
            &preview(&record.body),
            serde_json::json!({
                "route": "group",
                "groupId": group_id,
                "groupName": group.name,
                "senderId": actor.id,
                "messageId": record.id,
            }),
        )
        .await?;

        info!("📨 Group message {} persisted in {}", record.id, group_id);
        Ok(record)
    }

    /// 编辑私聊消息正文（仅原发送者）/ Edit a direct message body (original sender only)
    pub async fn edit_direct_message(
        &self,
        actor: &Identity,
        message_id: &str,
        body: String,
    ) -> Result<MessageRecord, HubError> {
        if body.trim().is_empty() {
            return Err(HubError::Validation("edited body must not be empty".to_string()));
        }
        let existing = self
            .messages
            .get_direct(message_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("message {} not found", message_id)))?;
        if existing.sender_id != actor.id {
            return Err(HubError::Authorization(
                "only the original sender may edit a message".to_string(),
            ));
        }

        let updated = self.messages.update_direct_body(message_id, body.trim()).await?;

        // 与发送时相同的频道集合 / Same channel set as at send time
        let frame = event::message_updated(&updated);
        self.emit_to_user(&updated.sender_id, &frame);
        self.emit_to_user(&updated.receiver_id, &frame);
        Ok(updated)
    }

    /// 删除私聊消息（仅原发送者）/ Delete a direct message (original sender only)
    pub async fn delete_direct_message(
        &self,
        actor: &Identity,
        message_id: &str,
    ) -> Result<(), HubError> {
        let existing = self
            .messages
            .get_direct(message_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("message {} not found", message_id)))?;
        if existing.sender_id != actor.id {
            return Err(HubError::Authorization(
                "only the original sender may delete a message".to_string(),
            ));
        }

        self.remove_attachment_best_effort(existing.attachment.as_deref()).await;
        self.messages.delete_direct(message_id).await?;

        let frame = event::message_deleted(message_id);
        self.emit_to_user(&existing.sender_id, &frame);
        self.emit_to_user(&existing.receiver_id, &frame);
        Ok(())
    }

    /// 删除群消息（仅原发送者）/ Delete a group message (original sender only)
    pub async fn delete_group_message(
        &self,
        actor: &Identity,
        message_id: &str,
    ) -> Result<(), HubError> {
        let existing = self
            .messages
            .get_group_message(message_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("message {} not found", message_id)))?;
        if existing.sender_id != actor.id {
            return Err(HubError::Authorization(
                "only the original sender may delete a message".to_string(),
            ));
        }

        self.remove_attachment_best_effort(existing.attachment.as_deref()).await;
        self.messages.delete_group_message(message_id).await?;
        self.emit_to_channel(
            &group_channel(&existing.group_id),
            &event::group_message_deleted(message_id, &existing.group_id),
        );
        Ok(())
    }

    /// 会话已读标记 / Thread read-marking
    ///
    /// 接收者批量标记来自某发送者的全部未读；重复调用不再翻转任何行，
    /// 但每次调用都发射自己的回执事件
    /// Receiver bulk-marks everything unread from one sender; repeat calls flip
    /// zero rows but still emit their own receipt event
    pub async fn mark_thread_read(
        &self,
        actor: &Identity,
        partner_id: &str,
    ) -> Result<usize, HubError> {
        if !self.users.exists(partner_id).await? {
            return Err(HubError::NotFound(format!("partner {} not found", partner_id)));
        }
        let flipped = self.messages.mark_thread_read(&actor.id, partner_id).await?;

        let frame = event::message_thread_read(&actor.id, partner_id);
        self.emit_to_user(&actor.id, &frame);
        self.emit_to_user(partner_id, &frame);
        Ok(flipped)
    }

    /// 附件清理（尽力而为）/ Attachment cleanup (best-effort)
    async fn remove_attachment_best_effort(&self, attachment: Option<&str>) {
        if let Some(path) = attachment {
            if let Err(e) = self.attachments.remove(path).await {
                warn!("⚠️  Attachment removal for {} failed (swallowed): {}", path, e);
            }
        }
    }
}
