//! 路由定义
//!
//! - 健康检查：/health
//! - 计数器快照：/metrics

use super::AppState;
use super::handlers::*;
use axum::{Router, routing::get};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
}
