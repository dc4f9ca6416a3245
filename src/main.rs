use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edu_connect_hub::hub::{Collaborators, EduConnectServer};
use edu_connect_hub::service::auth::{DevIdentityVerifier, HttpIdentityVerifier, IdentityVerifier};
use edu_connect_hub::service::push::{HttpPushDelivery, NoopPushDelivery, PushDelivery};
use edu_connect_hub::storage::memory::{
    MemoryAttachmentStore, MemoryGroupStore, MemoryMessageStore, MemoryNotificationStore,
    MemoryUserStore,
};
use edu_connect_hub::{config, router, tasks};

/// 命令行参数 / Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "edu-connect-hub WebSocket & HTTP server", long_about = None)]
struct Args {
    /// 配置文件路径 / Config file path
    #[arg(short = 'c', long = "config", default_value = "config/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let (server_config, auth_config, push_config) = config::load(&args.config)?;

    let verifier: Arc<dyn IdentityVerifier> = if auth_config.enabled {
        Arc::new(HttpIdentityVerifier::new(auth_config.clone()))
    } else {
        warn!("🔓 auth.enabled=false, accepting dev tokens ('<id>:<role>')");
        Arc::new(DevIdentityVerifier)
    };
    let push: Arc<dyn PushDelivery> = if push_config.enabled && push_config.url.is_some() {
        Arc::new(HttpPushDelivery::new(push_config.clone()))
    } else {
        Arc::new(NoopPushDelivery)
    };

    let server = EduConnectServer::new(
        server_config.clone(),
        auth_config,
        push_config,
        Collaborators {
            verifier,
            push,
            messages: Arc::new(MemoryMessageStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            groups: Arc::new(MemoryGroupStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            attachments: Arc::new(MemoryAttachmentStore::new()),
        },
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tasks::heartbeat::spawn_cleanup_task(server.clone(), server_config.timeout_ms, shutdown_rx);

    // WS入口 / WS ingress
    let ws_server = server.clone();
    let ws_host = server_config.host.clone();
    let ws_port = server_config.ws_port;
    tokio::spawn(async move {
        if let Err(e) = ws_server.run_ws(ws_host, ws_port).await {
            tracing::error!("WebSocket server failed: {}", e);
        }
    });

    // HTTP入口 / HTTP ingress
    let shared = Arc::new(server);
    let http_addr = format!("{}:{}", server_config.host, server_config.http_port);
    info!("🌐 HTTP API listening on {}", http_addr);
    let http = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(shared.clone()))
            .configure(router::configure)
    })
    .bind(&http_addr)?
    .run();

    tokio::select! {
        result = http => { result?; }
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
        }
    }
    let _ = shutdown_tx.send(true);
    Ok(())
}
