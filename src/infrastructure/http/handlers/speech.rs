//! Speech Handler - 合成端点
//!
//! 成功时返回音频字节（audio/wav + Content-Length + Content-Disposition），
//! 失败时由 ApiError 映射为 {"detail": ...} 与对应状态码

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::infrastructure::http::dto::GenerateSpeechRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /generate-speech
pub async fn generate_speech(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateSpeechRequest>,
) -> Result<Response, ApiError> {
    let result = state.pipeline.synthesize(req.into()).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.len())
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=speech.wav",
        )
        .body(Body::from(result.audio))
        .map_err(|e| ApiError(crate::application::SynthesisError::internal(e.to_string())))?;

    Ok(response)
}
