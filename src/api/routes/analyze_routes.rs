//! Analyze Routes
//!
//! 定义单轮分析的 API 路由。

use axum::{Router, routing::post};

use crate::api::app_state::AppState;
use crate::api::handlers::analyze_handler::analyze;

/// 创建分析路由器
pub fn create_analyze_router() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}
