use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupMessageRequest {
    pub message_id: String,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(delete_message_handle)));
}

pub async fn delete_message_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<DeleteGroupMessageRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    match server.delete_group_message(&actor, &req.message_id).await {
        Ok(()) => respond_any(StatusCode::OK, serde_json::json!({ "ok": true })),
        Err(e) => respond_error(&e),
    }
}
