use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::get().to(online_handle)));
}

/// 在线用户查询 / Online users query
pub async fn online_handle(
    server: web::Data<Arc<EduConnectServer>>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Err(e) = authenticate(&server, &http_req).await {
        return respond_error(&e);
    }
    let online = server.presence.online_user_ids();
    let total = online.len();
    respond_any(
        StatusCode::OK,
        serde_json::json!({ "onlineUserIds": online, "totalCount": total }),
    )
}
