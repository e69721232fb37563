//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /                 GET   服务信息
//! - /generate-speech  POST  文本合成，返回音频字节
//! - /voices           GET   音色列表
//! - /health           GET   健康检查（内存、已加载模型数、就绪标志）
//! - /memory           GET   内存监视器读数与阈值
//! - /cleanup          POST  强制淘汰全部模型

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/generate-speech", post(handlers::generate_speech))
        .route("/voices", get(handlers::list_voices))
        .route("/health", get(handlers::health))
        .route("/memory", get(handlers::memory))
        .route("/cleanup", post(handlers::cleanup))
}
