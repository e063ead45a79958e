mod app_state;
mod handlers;
mod ingest;
mod mqtt_client;
mod storage;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use smartsense_shared::load_backend_config;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_state::AppState;
use mqtt_client::SubscriberSession;
use storage::PgMeasurementStore;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartSense backend...");

    // 加载配置
    let config = load_backend_config();
    info!(
        "Configuration loaded: broker {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );

    // 初始化数据库连接池
    info!("Initializing database connection...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.connection_timeout,
        ))
        .connect(&config.database.url)
        .await
        .with_context(|| "Failed to connect to database")?;
    info!("Database connected successfully");

    let store = Arc::new(PgMeasurementStore::new(pool));

    // 验证连接并初始化表结构
    store.health_check().await?;
    store.init_schema().await?;
    info!("Database schema ready");

    // 创建订阅会话；生命周期由引导流程持有，停机经由取消令牌
    let shutdown = CancellationToken::new();
    let session = SubscriberSession::new(config.mqtt.clone(), store.clone());

    // 启动后台接收循环
    let subscriber_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { session.run(shutdown).await }
    });

    // 构建应用
    let app_state = AppState::new(store.clone());
    let app = create_app(app_state);

    // 启动 HTTP 服务器
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .with_context(|| "Invalid HTTP listen address")?;
    info!("Query service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // 等待订阅循环退出
    shutdown.cancel();
    if let Err(e) = subscriber_task.await {
        error!("Subscriber task terminated abnormally: {}", e);
    }

    info!("SmartSense backend stopped");
    Ok(())
}

// 等待 Ctrl-C，然后触发取消令牌
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }

    info!("Received shutdown signal, stopping backend...");
    shutdown.cancel();
}

fn create_app(app_state: AppState) -> Router {
    // 公开只读的遥测面板，跨域不作限制
    let middleware_layer = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .into_inner();

    Router::new()
        .route("/latest", get(handlers::latest_measurement))
        .route("/health", get(handlers::health_check))
        .layer(middleware_layer)
        .with_state(app_state)
}
