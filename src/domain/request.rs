//! Synthesis Request - 合成请求与结果
//!
//! 请求在管线入口处规范化后使用，从不持久化；
//! 结果只存在于单个请求的作用域内。

use serde::{Deserialize, Serialize};

/// 超长文本处理策略
///
/// 整个进程只使用一个策略（来自配置），不同调用路径不得混用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPolicy {
    /// 拒绝请求（默认）
    #[default]
    Reject,
    /// 截断到最大长度并记录警告
    Truncate,
}

/// 合成请求
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: String,
    /// 音色 ID，未知或缺失时回退到默认音色
    pub voice: Option<String>,
    /// 语速，钳制到配置范围
    pub speed: Option<f32>,
    /// 音调，钳制到配置范围
    pub pitch: Option<f32>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            speed: None,
            pitch: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }
}

/// 合成结果
///
/// 音频字节缓冲 + 内容类型，仅在单个请求作用域内存在
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub audio: Vec<u8>,
    pub content_type: &'static str,
}

impl SynthesisResult {
    pub fn wav(audio: Vec<u8>) -> Self {
        Self {
            audio,
            content_type: "audio/wav",
        }
    }

    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}
