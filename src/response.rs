use actix_web::{http::StatusCode, HttpResponse};

use crate::error::HubError;

// 通用 HTTP 响应封装（结构体自动转 JSON，失败则原样文本）
// Generic HTTP response helper: auto JSON from struct, fallback to text
pub fn respond_any<T: serde::Serialize + std::fmt::Debug>(code: StatusCode, data: T) -> HttpResponse {
    match serde_json::to_value(&data) {
        Ok(v) => HttpResponse::build(code).json(v),
        Err(_) => HttpResponse::build(code)
            .content_type("text/plain; charset=utf-8")
            .body(format!("{:?}", data)),
    }
}

// 错误响应：分类映射状态码 / Error response mapped from the taxonomy
pub fn respond_error(err: &HubError) -> HttpResponse {
    respond_any(err.status_code(), serde_json::json!({ "error": err.to_string() }))
}
