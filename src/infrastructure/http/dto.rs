//! Data Transfer Objects
//!
//! HTTP 请求/响应结构

use serde::{Deserialize, Serialize};

use crate::domain::{SynthesisRequest, VoiceProfile};

/// 合成请求体
#[derive(Debug, Deserialize)]
pub struct GenerateSpeechRequest {
    pub text: String,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub pitch: Option<f32>,
}

impl From<GenerateSpeechRequest> for SynthesisRequest {
    fn from(req: GenerateSpeechRequest) -> Self {
        Self {
            text: req.text,
            voice: req.voice,
            speed: req.speed,
            pitch: req.pitch,
        }
    }
}

/// 音色信息
#[derive(Debug, Serialize)]
pub struct VoiceInfo {
    pub id: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub description: String,
}

impl From<&VoiceProfile> for VoiceInfo {
    fn from(profile: &VoiceProfile) -> Self {
        Self {
            id: profile.id.clone(),
            model: profile.model_key.to_string(),
            speaker: profile.speaker.clone(),
            description: profile.description.clone(),
        }
    }
}

/// 音色列表响应
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
    pub default: String,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub memory_mb: f64,
    pub models_loaded: usize,
    pub ready: bool,
    pub uptime_secs: i64,
}

/// 内存状态响应
#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub usage_mb: f64,
    pub warn_threshold_mb: f64,
    pub hard_threshold_mb: f64,
}

/// 清理响应
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub models_unloaded: usize,
    pub memory_mb: f64,
}

/// 服务信息响应
#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}
