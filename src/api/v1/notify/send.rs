use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, Responder};
use std::sync::Arc;

use crate::api::authenticate;
use crate::domain::model::RecipientSet;
use crate::error::HubError;
use crate::hub::EduConnectServer;
use crate::response::{respond_any, respond_error};

/// 生产者事件入口 / Producer event ingress
///
/// 评测、管理端相关活动等生产者经此触发扇出
/// Evaluations and admin-relevant activity trigger fanout through here
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub recipients: Recipients,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "scope")]
pub enum Recipients {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    Admins,
    #[serde(rename_all = "camelCase")]
    Group { group_id: String },
}

pub fn register(cfg: &mut actix_web::web::ServiceConfig, path: &str) {
    cfg.service(web::resource(path).route(web::post().to(notify_handle)));
}

pub async fn notify_handle(
    server: web::Data<Arc<EduConnectServer>>,
    req: web::Json<NotifyRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let actor = match authenticate(&server, &http_req).await {
        Ok(actor) => actor,
        Err(e) => return respond_error(&e),
    };
    let req = req.into_inner();
    if req.kind.trim().is_empty() || req.message.trim().is_empty() {
        return respond_error(&HubError::Validation(
            "type and message are required".to_string(),
        ));
    }
    let recipients = match req.recipients {
        Recipients::User { user_id } => RecipientSet::User(user_id),
        Recipients::Admins => RecipientSet::Admins,
        Recipients::Group { group_id } => RecipientSet::GroupMembers(group_id),
    };
    match server
        .fan_out(&actor.id, recipients, &req.kind, &req.message, req.data)
        .await
    {
        Ok(delivered) => respond_any(StatusCode::OK, serde_json::json!({ "recipients": delivered })),
        Err(e) => respond_error(&e),
    }
}
