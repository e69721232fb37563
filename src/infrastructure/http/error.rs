//! HTTP Error Handling
//!
//! 管线错误到 HTTP 状态码的唯一边界映射表。
//! 响应体统一为 {"detail": "..."}。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::SynthesisError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// API 错误
#[derive(Debug)]
pub struct ApiError(pub SynthesisError);

impl From<SynthesisError> for ApiError {
    fn from(err: SynthesisError) -> Self {
        Self(err)
    }
}

/// 错误种类 -> 状态码的边界映射表
pub fn status_for(err: &SynthesisError) -> StatusCode {
    match err {
        SynthesisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SynthesisError::ServiceNotReady(_) | SynthesisError::Overloaded(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SynthesisError::ModelLoadFailed(_)
        | SynthesisError::GenerationFailed(_)
        | SynthesisError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = self.0.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %detail, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %detail, "Request rejected");
        }

        (status, Json(ErrorDetail { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SynthesisError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SynthesisError::Overloaded("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SynthesisError::ServiceNotReady("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SynthesisError::ModelLoadFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&SynthesisError::GenerationFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&SynthesisError::InternalError("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
