pub mod v1;

use actix_web::http::header;
use actix_web::HttpRequest;

use crate::domain::model::Identity;
use crate::error::HubError;
use crate::hub::EduConnectServer;

/// 请求级鉴权：Bearer令牌交由身份校验协作方 / Per-request auth: Bearer token via the identity verifier
pub async fn authenticate(
    server: &EduConnectServer,
    req: &HttpRequest,
) -> Result<Identity, HubError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");
    server.verifier.verify(token).await
}
