//! Synthesis Pipeline - 合成管线
//!
//! 一次请求的完整流程:
//! 规范化 -> 音色解析 -> 参数钳制 -> 准入 -> 获取句柄 ->
//! 作用域临时文件内合成 -> 读回字节 -> 调度请求后回收提示。
//!
//! 被拒绝的请求不会触碰缓存；临时输出文件在任何退出路径
//! （成功、内部失败、意外故障）都会被清理。

use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::SynthesisError;
use crate::application::ports::{MemoryMonitorPort, SynthesisParams};
use crate::domain::{SynthesisRequest, SynthesisResult, TextPolicy, VoiceCatalog};
use crate::infrastructure::cache::ModelCache;
use crate::infrastructure::memory::{Admission, AdmissionController};

/// 管线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 最大文本长度（字符数）
    pub max_text_len: usize,
    /// 超长文本策略，整个进程只用一个
    pub text_policy: TextPolicy,
    /// 语速下界
    pub speed_min: f32,
    /// 语速上界
    pub speed_max: f32,
    /// 音调下界
    pub pitch_min: f32,
    /// 音调上界
    pub pitch_max: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_len: 5000,
            text_policy: TextPolicy::Reject,
            speed_min: 0.5,
            speed_max: 2.0,
            pitch_min: 0.5,
            pitch_max: 2.0,
        }
    }
}

/// 合成管线
pub struct SynthesisPipeline {
    catalog: Arc<VoiceCatalog>,
    cache: Arc<ModelCache>,
    admission: Arc<AdmissionController>,
    monitor: Arc<dyn MemoryMonitorPort>,
    config: PipelineConfig,
}

impl SynthesisPipeline {
    pub fn new(
        catalog: Arc<VoiceCatalog>,
        cache: Arc<ModelCache>,
        admission: Arc<AdmissionController>,
        monitor: Arc<dyn MemoryMonitorPort>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            admission,
            monitor,
            config,
        }
    }

    /// 执行一次合成请求
    pub async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let request_id = Uuid::new_v4();
        let result = self.synthesize_inner(request_id, request).await;

        // 无论结果如何都调度请求后回收提示，不阻塞返回
        let monitor = self.monitor.clone();
        tokio::spawn(async move {
            monitor.reclaim_hint();
        });

        match &result {
            Ok(output) => {
                tracing::info!(
                    request_id = %request_id,
                    audio_size = output.len(),
                    "Synthesis completed"
                );
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Synthesis failed");
            }
        }

        result
    }

    async fn synthesize_inner(
        &self,
        request_id: Uuid,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        // 1. 文本规范化
        let text = request.text.trim();
        if text.is_empty() {
            return Err(SynthesisError::invalid_input("Text cannot be empty."));
        }
        let text = self.apply_text_policy(request_id, text)?;

        // 2. 音色解析（未知 ID 静默回退默认音色）
        let profile = self
            .catalog
            .resolve(request.voice.as_deref())
            .ok_or_else(|| SynthesisError::ServiceNotReady("No voices configured".to_string()))?;

        // 3. 参数钳制:越界值永不透传给外部能力
        let speed = request
            .speed
            .unwrap_or(1.0)
            .clamp(self.config.speed_min, self.config.speed_max);
        let pitch = request
            .pitch
            .unwrap_or(1.0)
            .clamp(self.config.pitch_min, self.config.pitch_max);

        tracing::debug!(
            request_id = %request_id,
            voice = %profile.id,
            model_key = %profile.model_key,
            text_len = text.chars().count(),
            speed,
            pitch,
            "Synthesis request accepted for processing"
        );

        // 4. 准入:被拒绝的请求不触碰缓存
        if self.admission.admit().await == Admission::Reject {
            return Err(SynthesisError::overloaded(
                "Server under memory pressure, try again later.",
            ));
        }

        // 5. 获取模型句柄
        let handle = self.cache.acquire(&profile.model_key).await?;

        // 6. 合成到作用域临时文件，Drop 时在任何退出路径上删除
        let out_file = tempfile::Builder::new()
            .prefix("vocel-")
            .suffix(".wav")
            .tempfile()?;

        let params = SynthesisParams {
            text,
            speaker: profile.speaker.clone(),
            speed,
            pitch,
        };
        handle
            .synthesize_to(params, out_file.path())
            .await
            .map_err(|e| SynthesisError::GenerationFailed(e.to_string()))?;

        // 7. 读回音频:空输出是失败，不是成功
        let audio = tokio::fs::read(out_file.path()).await?;
        if audio.is_empty() {
            return Err(SynthesisError::GenerationFailed(
                "Synthesis produced no audio".to_string(),
            ));
        }

        Ok(SynthesisResult::wav(audio))
    }

    /// 应用超长文本策略
    fn apply_text_policy(&self, request_id: Uuid, text: &str) -> Result<String, SynthesisError> {
        let char_count = text.chars().count();
        if char_count <= self.config.max_text_len {
            return Ok(text.to_string());
        }

        match self.config.text_policy {
            TextPolicy::Reject => Err(SynthesisError::InvalidInput(format!(
                "Text too long. Maximum {} characters.",
                self.config.max_text_len
            ))),
            TextPolicy::Truncate => {
                tracing::warn!(
                    request_id = %request_id,
                    char_count,
                    max_text_len = self.config.max_text_len,
                    "Text over limit, truncating"
                );
                Ok(text.chars().take(self.config.max_text_len).collect())
            }
        }
    }
}
