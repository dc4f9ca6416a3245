//! 通知扇出 / Notification fanout
//!
//! 每个接收者：先落通知记录，再向其个人频道发射；推送在后台任务中尽力投递，
//! 不占用触发请求的响应路径。持久化失败使整个操作失败；推送失败只记录。
//! Per recipient: persist the notification row, then emit to the personal
//! channel; push runs best-effort on a background task, never on the response
//! path of the triggering request. Persistence failure fails the operation;
//! push failure is only logged.

use tracing::info;

use crate::domain::event;
use crate::domain::model::RecipientSet;
use crate::error::HubError;
use crate::hub::EduConnectServer;
use crate::service::push;

impl EduConnectServer {
    /// 解析接收者并逐一扇出，返回实际接收人数
    /// Resolve recipients and fan out one by one; returns the recipient count
    ///
    /// 发起者永远被排除 / The acting user is always excluded
    pub async fn fan_out(
        &self,
        actor_id: &str,
        recipients: RecipientSet,
        kind: &str,
        message: &str,
        data: serde_json::Value,
    ) -> Result<usize, HubError> {
        let resolved: Vec<String> = match recipients {
            RecipientSet::User(user_id) => vec![user_id],
            RecipientSet::Admins => self.users.admin_ids().await?,
            RecipientSet::GroupMembers(group_id) => self.groups.members(&group_id).await?,
        };

        let mut push_targets = Vec::new();
        for recipient_id in resolved.into_iter().filter(|r| r != actor_id) {
            let row = self
                .notifications
                .insert(&recipient_id, kind, message, data.clone())
                .await?;
            self.emit_to_user(&recipient_id, &event::notification_new(&row));
            push_targets.push(recipient_id);
        }
        let delivered = push_targets.len();

        // 推送脱离响应路径，调用方在落库+发射完成后即返回
        // Push leaves the response path; the caller returns once persist+emit are done
        if !push_targets.is_empty() {
            let push = self.push.clone();
            let kind = kind.to_string();
            let message = message.to_string();
            tokio::spawn(async move {
                for recipient_id in push_targets {
                    push::deliver_best_effort(push.as_ref(), &recipient_id, &kind, &message, &data)
                        .await;
                }
            });
        }
        if delivered > 0 {
            info!("🔔 Fanout '{}' reached {} recipient(s)", kind, delivered);
        }
        Ok(delivered)
    }
}
