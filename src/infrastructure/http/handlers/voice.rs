//! Voice Handler - 音色列表端点

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{VoiceInfo, VoicesResponse};
use crate::infrastructure::http::state::AppState;

/// GET /voices
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.catalog.voices().iter().map(VoiceInfo::from).collect(),
        default: state.catalog.default_id().to_string(),
    })
}
