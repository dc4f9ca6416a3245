use actix_web::http::StatusCode;

/// 错误分类 / Error taxonomy
///
/// 前四类同步返回给调用方；传输类失败只记录日志，从不向终端用户暴露
/// The first four surface synchronously to the caller; transient delivery
/// failures are only logged and never reach end users
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transient delivery failure: {0}")]
    TransientDelivery(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl HubError {
    /// HTTP状态码映射 / HTTP status code mapping
    pub fn status_code(&self) -> StatusCode {
        match self {
            HubError::Authentication(_) => StatusCode::UNAUTHORIZED,
            HubError::Validation(_) => StatusCode::BAD_REQUEST,
            HubError::Authorization(_) => StatusCode::FORBIDDEN,
            HubError::NotFound(_) => StatusCode::NOT_FOUND,
            HubError::TransientDelivery(_) => StatusCode::BAD_GATEWAY,
            HubError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
