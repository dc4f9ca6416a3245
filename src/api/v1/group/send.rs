use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSendRequest {
    pub group_id: String,
    pub body: Option<String>,
    pub attachment: Option<String>,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(group_send_handle)));
}

pub async fn group_send_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<GroupSendRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    let req = req.into_inner();
    match server
        .send_group_message(&actor, &req.group_id, req.body, req.attachment)
        .await
    {
        Ok(record) => respond_any(StatusCode::OK, record),
        Err(e) => respond_error(&e),
    }
}
