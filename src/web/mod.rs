pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{models::ModelManager, utils::error::ClassifyError, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use minijinja::Environment;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelManager>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(config: Config, models: ModelManager) -> Result<Self> {
        Ok(Self {
            config,
            models: Arc::new(models),
            templates: Arc::new(ui::build_templates()?),
        })
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 准备上传目录
    let upload_dir = config.upload_dir();
    tokio::fs::create_dir_all(&upload_dir).await?;
    tracing::info!("Upload directory: {}", upload_dir.display());

    // 启动时加载模型和标签
    let models = ModelManager::load(&config)?;
    let state = AppState::new(config.clone(), models)?;

    let app = create_app(state);

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                    - Upload form");
    tracing::info!("  POST /                    - Classify uploaded image");
    tracing::info!("  GET  /uploads/{{filename}} - Uploaded image");
    tracing::info!("  POST /api/classify        - JSON classification");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/info            - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

/// 构建应用路由
pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // 表单路由
        .route(
            "/",
            get(handlers::index_handler).post(handlers::upload_handler),
        )
        .route("/uploads/:filename", get(handlers::uploaded_file_handler))
        // API路由
        .route("/api/classify", post(handlers::classify_api_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        // 静态文件
        .nest_service("/static", ServeDir::new(static_dir))
        // 中间件
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // 超限在读取multipart字段时报错，由处理器转为提示消息
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server_config.request_timeout,
        )))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let models = Arc::clone(&state.models);
    tokio::task::spawn_blocking(move || models.health_check())
        .await
        .map_err(|e| ClassifyError::Internal(format!("Health check task failed: {}", e)))??;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.get_stats();

    Json(json!({
        "service": "Leafscan",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "accepted_extensions": crate::utils::ALLOWED_EXTENSIONS,
    }))
}
