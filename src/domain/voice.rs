//! Voice Catalog - 音色目录
//!
//! 音色表在启动时从静态配置构建一次，之后不可变。
//! 未知音色 ID 静默回退到默认音色（刻意的宽松策略，不报错）。

use serde::{Deserialize, Serialize};

/// 模型缓存键
///
/// 标识 Resource Handle 由哪个外部模型配置构建，按值比较相等。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelKey(String);

impl ModelKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// 音色配置
///
/// 启动后不可变
#[derive(Debug, Clone, Serialize)]
pub struct VoiceProfile {
    /// 音色 ID（对外暴露的名称）
    pub id: String,
    /// 对应的模型键
    pub model_key: ModelKey,
    /// 多说话人模型的说话人 ID
    pub speaker: Option<String>,
    /// 音色描述
    pub description: String,
}

/// 音色目录
///
/// 不变量:
/// - 启动后不可变
/// - `resolve` 对未知/缺失的音色 ID 永不报错，回退到默认音色
pub struct VoiceCatalog {
    voices: Vec<VoiceProfile>,
    default_id: String,
}

impl VoiceCatalog {
    /// 从音色列表构建目录
    ///
    /// 如果 `default_id` 不在列表中，回退时使用第一个音色并记录警告
    pub fn new(voices: Vec<VoiceProfile>, default_id: impl Into<String>) -> Self {
        let default_id = default_id.into();
        if !voices.is_empty() && !voices.iter().any(|v| v.id == default_id) {
            tracing::warn!(
                default_voice = %default_id,
                "Configured default voice not in catalog, falling back to first voice"
            );
        }
        Self { voices, default_id }
    }

    /// 内置音色表
    ///
    /// 与外部模型运行时支持的模型配置对应
    pub fn builtin(default_id: impl Into<String>) -> Self {
        let vits = ModelKey::new("tts_models/en/vctk/vits");
        let voices = vec![
            VoiceProfile {
                id: "female_calm".to_string(),
                model_key: ModelKey::new("tts_models/en/ljspeech/tacotron2-DDC"),
                speaker: None,
                description: "Female, calm and clear".to_string(),
            },
            VoiceProfile {
                id: "female_expressive".to_string(),
                model_key: vits.clone(),
                speaker: Some("p225".to_string()),
                description: "Female, expressive".to_string(),
            },
            VoiceProfile {
                id: "male_deep".to_string(),
                model_key: vits.clone(),
                speaker: Some("p226".to_string()),
                description: "Male, deep voice".to_string(),
            },
            VoiceProfile {
                id: "female_young".to_string(),
                model_key: vits.clone(),
                speaker: Some("p231".to_string()),
                description: "Female, young and energetic".to_string(),
            },
            VoiceProfile {
                id: "male_british".to_string(),
                model_key: vits.clone(),
                speaker: Some("p237".to_string()),
                description: "Male, British accent".to_string(),
            },
            VoiceProfile {
                id: "female_american".to_string(),
                model_key: vits,
                speaker: Some("p232".to_string()),
                description: "Female, American accent".to_string(),
            },
        ];
        Self::new(voices, default_id)
    }

    /// 解析音色 ID
    ///
    /// 未知或缺失的 ID 静默回退到默认音色；仅当目录为空时返回 None
    pub fn resolve(&self, id: Option<&str>) -> Option<&VoiceProfile> {
        if let Some(id) = id {
            if let Some(profile) = self.voices.iter().find(|v| v.id == id) {
                return Some(profile);
            }
            tracing::debug!(voice = %id, "Unknown voice id, using default");
        }
        self.default_profile()
    }

    /// 默认音色
    pub fn default_profile(&self) -> Option<&VoiceProfile> {
        self.voices
            .iter()
            .find(|v| v.id == self.default_id)
            .or_else(|| self.voices.first())
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn voices(&self) -> &[VoiceProfile] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
