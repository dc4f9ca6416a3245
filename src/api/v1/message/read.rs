use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadReadRequest {
    pub partner_id: String,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(read_handle)));
}

/// 会话级批量已读 / Bulk thread read-marking
pub async fn read_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<ThreadReadRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    match server.mark_thread_read(&actor, &req.partner_id).await {
        Ok(flipped) => respond_any(StatusCode::OK, serde_json::json!({ "markedRead": flipped })),
        Err(e) => respond_error(&e),
    }
}
