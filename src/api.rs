//! HTTP API 服务
//!
//! 向外部输入注入端提供轨迹合成接口。
//! 每个请求使用独立的熵播种随机源，请求之间不共享可变状态。

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::bezier::Point;
use crate::config::{MaskConfig, TimingParams};
use crate::error::TrajectoryError;
use crate::trajectory::TrajectorySynthesizer;

/// 坐标绝对值上限 (像素)，防止超大跨度导致采样点数失控
pub const MAX_COORDINATE: f64 = 100_000.0;

/// API 服务共享状态
pub struct AppState {
    pub config: Arc<MaskConfig>,
}

/// 构建路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/trajectory", post(trajectory))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ================================================================
// Handlers
// ================================================================

async fn index() -> &'static str {
    concat!("MimicCursor API v", env!("CARGO_PKG_VERSION"), " (Rust)")
}

async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let timing = TimingParams::from_config(&*state.config);
    Json(serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "timing": timing,
    }))
}

#[derive(Deserialize)]
struct TrajectoryRequest {
    from: [f64; 2],
    to: [f64; 2],
}

#[derive(Serialize)]
struct TrajectoryResponse {
    /// x0, y0, x1, y1, ...
    points: Vec<i32>,
    count: usize,
}

/// 请求错误 → 400
struct ApiError(String);

impl From<TrajectoryError> for ApiError {
    fn from(e: TrajectoryError) -> Self {
        Self(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.0 })),
        )
            .into_response()
    }
}

async fn trajectory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrajectoryRequest>,
) -> Result<Json<TrajectoryResponse>, ApiError> {
    let from = Point::new(req.from[0], req.from[1]);
    let to = Point::new(req.to[0], req.to[1]);

    let in_range = |p: &Point| p.x.abs() <= MAX_COORDINATE && p.y.abs() <= MAX_COORDINATE;
    if !in_range(&from) || !in_range(&to) {
        warn!("⚠️ 坐标超出范围: {from:?} → {to:?}");
        return Err(ApiError(format!("坐标绝对值不能超过 {MAX_COORDINATE}")));
    }

    let mut synth = TrajectorySynthesizer::new(StdRng::from_entropy(), state.config.clone());
    let traj = synth.synthesize(from, to)?;
    debug!("📤 返回轨迹: {} 点", traj.len());

    Ok(Json(TrajectoryResponse {
        count: traj.len(),
        points: traj.flatten(),
    }))
}
