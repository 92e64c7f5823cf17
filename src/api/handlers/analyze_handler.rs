use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{
        app_state::AppState,
        dto::analyze_dto::{AnalyzeRequest, AnalyzeResponse},
    },
    error::AppError,
    services::turn::TurnRequest,
};

/// 处理一轮：检测 + （确认诈骗时）人设交互
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Analyzing turn for session: {}", request.session_id);
    state.metrics.record_http_request();

    if request.session_id.trim().is_empty() {
        return Err(AppError::Validation("sessionId cannot be empty".to_string()));
    }

    let turn_request = TurnRequest {
        session_id: request.session_id,
        message: request.message.into_message(),
        history: request
            .conversation_history
            .into_iter()
            .map(|m| m.into_message())
            .collect(),
        metadata: request.metadata.into_metadata(),
    };

    let outcome = state.turn_service.process(turn_request).await.map_err(|e| {
        state.metrics.record_error();
        e
    })?;

    let response = AnalyzeResponse {
        session_id: outcome.session_id,
        analysis: outcome.analysis,
        reply: outcome.reply,
        trap_category: outcome.trap_category,
    };

    Ok(Json(response))
}
