use anyhow::Result;

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub ws_port: u16,
    pub http_port: u16,
    pub timeout_ms: u64,      // 心跳超时 / Heartbeat timeout
    pub auth_deadline_ms: u64, // 握手鉴权窗口 / Handshake auth window
}

#[derive(Clone)]
pub struct AuthConfigLite {
    pub enabled: bool,
    pub center_url: String,
    pub timeout_ms: u64,
}

#[derive(Clone)]
pub struct PushConfigLite {
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub secret: Option<String>,
    pub enabled: bool,
}

/// 加载配置 / Load configuration
///
/// 文件 + EDU_CONNECT_ 环境变量覆盖 / File plus EDU_CONNECT_ env overrides
pub fn load(path: &str) -> Result<(ServerConfig, AuthConfigLite, PushConfigLite)> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("EDU_CONNECT").separator("__"))
        .build()?;

    let get_str = |key: &str, default: &str| cfg.get_string(key).unwrap_or_else(|_| default.to_string());
    let get_int = |key: &str, default: i64| cfg.get_int(key).unwrap_or(default);

    Ok((
        ServerConfig {
            host: get_str("server.host", "127.0.0.1"),
            ws_port: get_int("server.ws_port", 5300) as u16,
            http_port: get_int("server.http_port", 8081) as u16,
            timeout_ms: get_int("server.timeout_ms", 60000) as u64,
            auth_deadline_ms: get_int("auth.deadline_ms", 2000) as u64,
        },
        AuthConfigLite {
            enabled: cfg.get_bool("auth.enabled").unwrap_or(false),
            center_url: get_str("auth.center_url", "http://127.0.0.1:8090"),
            timeout_ms: get_int("auth.timeout_ms", 1000) as u64,
        },
        PushConfigLite {
            url: cfg.get_string("push.url").ok(),
            timeout_ms: get_int("push.timeout_ms", 3000) as u64,
            secret: cfg.get_string("push.secret").ok(),
            enabled: cfg.get_bool("push.enabled").unwrap_or(false),
        },
    ))
}
