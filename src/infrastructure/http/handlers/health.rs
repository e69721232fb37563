//! Health Handlers - 健康检查、内存与清理端点

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{
    CleanupResponse, HealthResponse, MemoryResponse, ServiceInfoResponse,
};
use crate::infrastructure::http::state::AppState;

/// GET /
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        message: "Vocel TTS Service",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        memory_mb: state.monitor.usage_mb(),
        models_loaded: state.cache.loaded_count().await,
        ready: state.status.is_ready(),
        uptime_secs: state.status.uptime_secs(),
    })
}

/// GET /memory
pub async fn memory(State(state): State<Arc<AppState>>) -> Json<MemoryResponse> {
    Json(MemoryResponse {
        usage_mb: state.monitor.usage_mb(),
        warn_threshold_mb: state.memory_config.warn_threshold_mb,
        hard_threshold_mb: state.memory_config.hard_threshold_mb,
    })
}

/// POST /cleanup
///
/// 强制淘汰全部常驻模型并发回收提示
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Json<CleanupResponse> {
    let models_unloaded = state.cache.clear().await;
    tracing::info!(models_unloaded, "Forced cache cleanup");

    Json(CleanupResponse {
        models_unloaded,
        memory_mb: state.monitor.usage_mb(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::util::ServiceExt;

    use crate::application::{
        MemoryMonitorPort, PipelineConfig, SynthesisPipeline,
    };
    use crate::config::types::MemoryConfig;
    use crate::domain::VoiceCatalog;
    use crate::infrastructure::adapters::runtime::FakeModelRuntime;
    use crate::infrastructure::cache::{ModelCache, ModelCacheConfig};
    use crate::infrastructure::http::routes::create_routes;
    use crate::infrastructure::memory::{AdmissionConfig, AdmissionController};
    use crate::infrastructure::startup::ServiceStatus;

    struct FixedMonitor(f64);

    impl MemoryMonitorPort for FixedMonitor {
        fn usage_mb(&self) -> f64 {
            self.0
        }

        fn reclaim_hint(&self) {}
    }

    fn test_state(runtime: Arc<FakeModelRuntime>, usage_mb: f64) -> Arc<AppState> {
        let monitor: Arc<dyn MemoryMonitorPort> = Arc::new(FixedMonitor(usage_mb));
        let catalog = Arc::new(VoiceCatalog::builtin("female_calm"));
        let cache = Arc::new(ModelCache::new(
            ModelCacheConfig { capacity: 1 },
            runtime,
            monitor.clone(),
        ));
        let admission = Arc::new(AdmissionController::new(
            monitor.clone(),
            AdmissionConfig {
                warn_threshold_mb: 1000.0,
                hard_threshold_mb: 2000.0,
                retry_wait: Duration::from_millis(10),
            },
        ));
        let pipeline = SynthesisPipeline::new(
            catalog.clone(),
            cache.clone(),
            admission,
            monitor.clone(),
            PipelineConfig::default(),
        );
        let status = Arc::new(ServiceStatus::new());
        status.mark_ready();

        Arc::new(AppState::new(
            pipeline,
            cache,
            monitor,
            catalog,
            status,
            MemoryConfig::default(),
        ))
    }

    fn test_app(state: Arc<AppState>) -> axum::Router {
        create_routes().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_loaded_models_and_ready() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let state = test_state(runtime, 100.0);
        let app = test_app(state.clone());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["models_loaded"], 0);
        assert_eq!(json["ready"], true);
        assert_eq!(json["memory_mb"], 100.0);
    }

    #[tokio::test]
    async fn test_voices_lists_catalog_with_default() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let app = test_app(test_state(runtime, 100.0));

        let response = app
            .oneshot(Request::get("/voices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["default"], "female_calm");
        assert_eq!(json["voices"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_memory_reports_thresholds() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let app = test_app(test_state(runtime, 123.0));

        let response = app
            .oneshot(Request::get("/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["usage_mb"], 123.0);
        assert_eq!(json["warn_threshold_mb"], 3072.0);
        assert_eq!(json["hard_threshold_mb"], 3584.0);
    }

    #[tokio::test]
    async fn test_cleanup_unloads_models() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let state = test_state(runtime.clone(), 100.0);

        // 先通过合成请求加载一个模型
        let app = test_app(state.clone());
        let request = Request::post("/generate-speech")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "hello"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.cache.loaded_count().await, 1);

        let app = test_app(state.clone());
        let response = app
            .oneshot(Request::post("/cleanup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["models_unloaded"], 1);
        assert_eq!(state.cache.loaded_count().await, 0);
        assert_eq!(runtime.release_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_speech_returns_audio_headers() {
        let runtime = Arc::new(FakeModelRuntime::with_audio(vec![1, 2, 3, 4]));
        let app = test_app(test_state(runtime, 100.0));

        let request = Request::post("/generate-speech")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "hello", "voice": "male_deep"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/wav");
        assert_eq!(response.headers()["content-length"], "4");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=speech.wav"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_generate_speech_empty_text_is_400() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let app = test_app(test_state(runtime, 100.0));

        let request = Request::post("/generate-speech")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "   "}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_generate_speech_under_pressure_is_503() {
        let runtime = Arc::new(FakeModelRuntime::new());
        // 高于硬阈值
        let app = test_app(test_state(runtime.clone(), 2500.0));

        let request = Request::post("/generate-speech")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "hello"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(runtime.load_count(), 0);
    }
}
