//! 计数器快照与当前队列深度。
//!
//! - GET /metrics

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use daq_telemetry::{MetricsSnapshot, metrics};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    /// 队列读取失败时为 null。
    pub spool_depth: Option<u64>,
}

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    let spool_depth = match state.spool.len().await {
        Ok(depth) => Some(depth),
        Err(err) => {
            warn!(target: "daq.storage", error = %err, "spool_depth_unavailable");
            None
        }
    };
    (
        StatusCode::OK,
        Json(MetricsResponse {
            counters: metrics().snapshot(),
            spool_depth,
        }),
    )
        .into_response()
}
