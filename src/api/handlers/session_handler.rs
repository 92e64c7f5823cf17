use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::session_dto::*},
    error::AppError,
};

/// 列出全部会话标识
pub async fn list_sessions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    debug!("Listing sessions");
    state.metrics.record_http_request();

    let sessions = state.registry.list_ids();
    let total = sessions.len();

    Ok(Json(SessionListResponse { sessions, total }))
}

/// 查询会话摘要
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting session: {}", session_id);
    state.metrics.record_http_request();

    let entry = state
        .registry
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", session_id)))?;

    let snapshot = entry.lock().await;
    let response = SessionSummaryResponse::from_state(&snapshot);

    Ok(Json(response))
}

/// 删除会话（过期策略由外部驱动）
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting session: {}", session_id);
    state.metrics.record_http_request();

    if !state.registry.remove(&session_id) {
        return Err(AppError::NotFound(format!(
            "Session not found: {}",
            session_id
        )));
    }

    Ok(Json(DeleteSessionResponse {
        id: session_id,
        message: "Session deleted successfully".to_string(),
    }))
}
