use actix_web::web;

/// 路由配置包装 / Route configuration wrapper
pub fn configure(cfg: &mut web::ServiceConfig) {
    crate::api::v1::health::basic::register(cfg, "/v1/health");
    crate::api::v1::connection::online::register(cfg, "/v1/presence/online");

    crate::api::v1::message::send::register(cfg, "/v1/message/send");
    crate::api::v1::message::edit::register(cfg, "/v1/message/edit");
    crate::api::v1::message::delete::register(cfg, "/v1/message/delete");
    crate::api::v1::message::read::register(cfg, "/v1/message/read");

    crate::api::v1::group::create::register(cfg, "/v1/group/create");
    crate::api::v1::group::add_member::register(cfg, "/v1/group/members/add");
    crate::api::v1::group::remove_member::register(cfg, "/v1/group/members/remove");
    crate::api::v1::group::leave::register(cfg, "/v1/group/leave");
    crate::api::v1::group::delete::register(cfg, "/v1/group/delete");
    crate::api::v1::group::send::register(cfg, "/v1/group/send");
    crate::api::v1::group::delete_message::register(cfg, "/v1/group/message/delete");

    crate::api::v1::notify::send::register(cfg, "/v1/notify/send");
}
