use async_trait::async_trait;
use anyhow::Result;
use tracing::{debug, warn};

use crate::config::PushConfigLite;

/// 推送投递协作方 / Push-delivery collaborator
///
/// 尽力而为副作用的统一接口：失败被吞掉并记录，永不回滚通知记录或令触发请求失败
/// The one explicit best-effort side-effect seam: failures are swallowed and
/// logged, never rolling back the notification row or failing the trigger
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn send(
        &self,
        recipient_id: &str,
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<()>;
}

/// 统一的尽力而为包装 / The single best-effort wrapper
pub async fn deliver_best_effort(
    push: &dyn PushDelivery,
    recipient_id: &str,
    title: &str,
    body: &str,
    data: &serde_json::Value,
) {
    match push.send(recipient_id, title, body, data).await {
        Ok(()) => debug!("📲 Push delivered to {}", recipient_id),
        Err(e) => warn!("⚠️  Push delivery to {} failed (swallowed): {}", recipient_id, e),
    }
}

/// HTTP推送实现 / HTTP push implementation
pub struct HttpPushDelivery {
    config: PushConfigLite,
}

impl HttpPushDelivery {
    pub fn new(config: PushConfigLite) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PushDelivery for HttpPushDelivery {
    async fn send(
        &self,
        recipient_id: &str,
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<()> {
        let url = match (&self.config.url, self.config.enabled) {
            (Some(url), true) => url.clone(),
            _ => return Ok(()),
        };
        let payload = serde_json::json!({
            "recipientUserId": recipient_id,
            "title": title,
            "body": body,
            "data": data,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        });
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .build()?;
        let mut request = client.post(&url).json(&payload);
        if let Some(secret) = &self.config.secret {
            request = request.header("X-EduConnect-Signature", sign_payload(&payload, secret));
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("push provider returned {}: {}", status, text);
        }
        Ok(())
    }
}

// 生成推送签名 / Generate push signature
pub fn sign_payload(payload: &serde_json::Value, secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.to_string().as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// 空推送实现（未配置推送源时）/ No-op push (no provider configured)
pub struct NoopPushDelivery;

#[async_trait]
impl PushDelivery for NoopPushDelivery {
    async fn send(&self, _: &str, _: &str, _: &str, _: &serde_json::Value) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FailingPush;

    #[async_trait]
    impl PushDelivery for FailingPush {
        async fn send(&self, _: &str, _: &str, _: &str, _: &serde_json::Value) -> Result<()> {
            anyhow::bail!("provider down")
        }
    }

    struct RecordingPush {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushDelivery for RecordingPush {
        async fn send(&self, recipient: &str, _: &str, _: &str, _: &serde_json::Value) -> Result<()> {
            self.calls.lock().push(recipient.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn best_effort_swallows_provider_failure() {
        // 不应panic也不应返回错误 / Must neither panic nor surface an error
        deliver_best_effort(&FailingPush, "u1", "t", "b", &serde_json::json!({})).await;
    }

    #[tokio::test]
    async fn best_effort_forwards_on_success() {
        let push = RecordingPush { calls: Mutex::new(Vec::new()) };
        deliver_best_effort(&push, "u1", "t", "b", &serde_json::json!({})).await;
        assert_eq!(*push.calls.lock(), vec!["u1".to_string()]);
    }

    #[test]
    fn signature_is_stable_for_same_payload() {
        let payload = serde_json::json!({"a": 1});
        let s1 = sign_payload(&payload, "secret");
        let s2 = sign_payload(&payload, "secret");
        assert_eq!(s1, s2);
        assert!(s1.starts_with("sha256="));
    }
}
