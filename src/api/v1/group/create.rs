use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

#[derive(serde::Deserialize)]
pub struct CreateRequest {
    pub name: String,
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(create_handle)));
}

pub async fn create_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<CreateRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    match server.create_group(&actor, &req.name).await {
        Ok(group) => respond_any(StatusCode::OK, group),
        Err(e) => respond_error(&e),
    }
}
