use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 平台角色 / Platform role
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Supervisor,
    Admin,
}

/// 已验证身份 / Verified identity
///
/// 由身份校验协作方在握手时返回
/// Returned by the identity-verification collaborator at handshake time
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

/// 鉴权中心返回的校验结果 / Verification result returned by the auth center
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct VerifiedCredential {
    pub id: String,
    pub role: Role,
    pub expiry: i64, // 过期时间（毫秒）/ Expiry timestamp (ms)
}

/// 通知接收者集合 / Notification recipient set
///
/// 发起者永远不在接收者之列 / The acting user is never a recipient
#[derive(Debug, Clone)]
pub enum RecipientSet {
    /// 单个用户 / A single user
    User(String),
    /// 所有管理员 / All users with the admin role
    Admins,
    /// 群成员（除发起者外）/ All group members minus the acting user
    GroupMembers(String),
}
