use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub group_id: String,
    pub user_id: String,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(add_member_handle)));
}

pub async fn add_member_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<AddMemberRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    match server.add_group_member(&actor, &req.group_id, &req.user_id).await {
        Ok(()) => respond_any(StatusCode::OK, serde_json::json!({ "ok": true })),
        Err(e) => respond_error(&e),
    }
}
