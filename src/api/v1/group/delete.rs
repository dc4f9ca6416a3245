use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupRequest {
    pub group_id: String,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(delete_handle)));
}

pub async fn delete_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<DeleteGroupRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    match server.delete_group(&actor, &req.group_id).await {
        Ok(()) => respond_any(StatusCode::OK, serde_json::json!({ "ok": true })),
        Err(e) => respond_error(&e),
    }
}
