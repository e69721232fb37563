//! HTTP Model Runtime - 调用本机模型运行时 sidecar
//!
//! 实现 ModelRuntimePort，通过 HTTP 与模型运行时交互:
//!
//! POST {base}/models/load           {"model_key": "..."} -> {"session_id": "..."}
//! POST {base}/models/{id}/synthesize {"text", "speaker", "speed", "pitch"} -> audio/wav binary
//! POST {base}/models/{id}/release
//!
//! 句柄 Drop 时尽力通知 release;运行时也会在连接断开后自行回收会话。

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ModelHandlePort, ModelRuntimePort, RuntimeError, SynthesisParams,
};
use crate::domain::ModelKey;

/// 加载请求体
#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model_key: &'a str,
}

/// 加载响应体
#[derive(Debug, Deserialize)]
struct LoadResponse {
    session_id: String,
}

/// 合成请求体
#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker: Option<&'a str>,
    speed: f32,
    pitch: f32,
}

/// HTTP 运行时客户端配置
#[derive(Debug, Clone)]
pub struct HttpModelRuntimeConfig {
    /// 运行时 sidecar 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），加载和合成都可能很慢
    pub timeout_secs: u64,
}

impl Default for HttpModelRuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpModelRuntimeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 模型运行时
pub struct HttpModelRuntime {
    client: Client,
    config: HttpModelRuntimeConfig,
}

impl HttpModelRuntime {
    pub fn new(config: HttpModelRuntimeConfig) -> Result<Self, RuntimeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RuntimeError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn load_url(&self) -> String {
        format!("{}/models/load", self.config.base_url)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> RuntimeError {
    if e.is_timeout() {
        RuntimeError::Timeout
    } else if e.is_connect() {
        RuntimeError::NetworkError(format!("Cannot connect to model runtime: {}", e))
    } else {
        RuntimeError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl ModelRuntimePort for HttpModelRuntime {
    async fn load(&self, key: &ModelKey) -> Result<Arc<dyn ModelHandlePort>, RuntimeError> {
        tracing::debug!(url = %self.load_url(), model_key = %key, "Sending model load request");

        let response = self
            .client
            .post(self.load_url())
            .json(&LoadRequest {
                model_key: key.as_str(),
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RuntimeError::LoadFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: LoadResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(e.to_string()))?;

        tracing::info!(model_key = %key, session_id = %body.session_id, "Model session opened");

        Ok(Arc::new(HttpModelHandle {
            key: key.clone(),
            session_id: body.session_id,
            base_url: self.config.base_url.clone(),
            client: self.client.clone(),
        }))
    }
}

/// 远端模型会话句柄
struct HttpModelHandle {
    key: ModelKey,
    session_id: String,
    base_url: String,
    client: Client,
}

impl HttpModelHandle {
    fn synthesize_url(&self) -> String {
        format!("{}/models/{}/synthesize", self.base_url, self.session_id)
    }

    fn release_url(&self) -> String {
        format!("{}/models/{}/release", self.base_url, self.session_id)
    }
}

#[async_trait]
impl ModelHandlePort for HttpModelHandle {
    fn model_key(&self) -> &ModelKey {
        &self.key
    }

    async fn synthesize_to(
        &self,
        params: SynthesisParams,
        out_path: &Path,
    ) -> Result<(), RuntimeError> {
        let response = self
            .client
            .post(self.synthesize_url())
            .json(&SynthesizeRequest {
                text: &params.text,
                speaker: params.speaker.as_deref(),
                speed: params.speed,
                pitch: params.pitch,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RuntimeError::SynthesisFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        tokio::fs::write(out_path, &audio)
            .await
            .map_err(|e| RuntimeError::SynthesisFailed(e.to_string()))?;

        tracing::debug!(
            model_key = %self.key,
            session_id = %self.session_id,
            audio_size = audio.len(),
            "Synthesis response written"
        );

        Ok(())
    }
}

impl Drop for HttpModelHandle {
    fn drop(&mut self) {
        let client = self.client.clone();
        let url = self.release_url();
        let key = self.key.clone();

        // Drop 中无法 await:有运行时则后台通知，否则交给 sidecar 超时回收
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move {
                if let Err(e) = client.post(&url).send().await {
                    tracing::debug!(model_key = %key, error = %e, "Model release notify failed");
                } else {
                    tracing::info!(model_key = %key, "Model session released");
                }
            });
        } else {
            tracing::debug!(model_key = %key, "No runtime for release notify, relying on sidecar GC");
        }
    }
}
