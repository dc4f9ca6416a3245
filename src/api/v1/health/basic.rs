use actix_web::http::StatusCode;
use actix_web::{web, Responder};
use std::sync::Arc;

use crate::hub::EduConnectServer;
use crate::response::respond_any;

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::get().to(health_handle)));
}

pub async fn health_handle(server: web::Data<Arc<EduConnectServer>>) -> impl Responder {
    respond_any(
        StatusCode::OK,
        serde_json::json!({
            "status": "ok",
            "connections": server.connections.len(),
            "onlineUsers": server.presence.online_user_ids().len(),
        }),
    )
}
