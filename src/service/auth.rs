use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::config::AuthConfigLite;
use crate::domain::model::{Identity, Role, VerifiedCredential};
use crate::error::HubError;

/// 身份校验协作方 / Identity-verification collaborator
///
/// 校验不通过的连接在任何频道加入前被拒绝，服务端不做重试
/// Failed verification rejects the connection before any channel join; no server-side retry
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, HubError>;
}

/// 鉴权中心HTTP校验 / HTTP verification against the auth center
pub struct HttpIdentityVerifier {
    config: AuthConfigLite,
}

impl HttpIdentityVerifier {
    pub fn new(config: AuthConfigLite) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, HubError> {
        if token.is_empty() {
            return Err(HubError::Authentication("missing credential".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .build()
            .map_err(|e| HubError::Authentication(format!("auth client error: {}", e)))?;
        let resp = client
            .get(format!("{}/v1/sso/verify", self.config.center_url))
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| HubError::Authentication(format!("auth center unreachable: {}", e)))?;
        if !resp.status().is_success() {
            return Err(HubError::Authentication("invalid credential".to_string()));
        }
        let credential: VerifiedCredential = resp
            .json()
            .await
            .map_err(|e| HubError::Authentication(format!("malformed auth response: {}", e)))?;
        if credential.expiry <= chrono::Utc::now().timestamp_millis() {
            return Err(HubError::Authentication("credential expired".to_string()));
        }
        Ok(Identity { id: credential.id, role: credential.role })
    }
}

/// 开发态校验：接受 `<id>:<role>` 形式令牌 / Dev verifier: accepts `<id>:<role>` tokens
///
/// 仅在 auth.enabled=false 时使用 / Used only when auth.enabled=false
pub struct DevIdentityVerifier;

#[async_trait]
impl IdentityVerifier for DevIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, HubError> {
        let (id, role) = token
            .split_once(':')
            .ok_or_else(|| HubError::Authentication("malformed dev token".to_string()))?;
        if id.is_empty() {
            return Err(HubError::Authentication("malformed dev token".to_string()));
        }
        let role = match role {
            "student" => Role::Student,
            "supervisor" => Role::Supervisor,
            "admin" => Role::Admin,
            other => {
                warn!("unknown role in dev token: {}", other);
                return Err(HubError::Authentication("unknown role".to_string()));
            }
        };
        Ok(Identity { id: id.to_string(), role })
    }
}

/// 静态令牌表（测试用）/ Static token table (tests)
#[derive(Default)]
pub struct StaticIdentityVerifier {
    tokens: DashMap<String, Identity>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, token: &str, id: &str, role: Role) {
        self.tokens.insert(token.to_string(), Identity { id: id.to_string(), role });
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.remove(token);
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, HubError> {
        self.tokens
            .get(token)
            .map(|i| i.clone())
            .ok_or_else(|| HubError::Authentication("invalid credential".to_string()))
    }
}
