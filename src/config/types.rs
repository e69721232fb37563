//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::domain::TextPolicy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 模型运行时配置
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// 模型缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 内存阈值配置
    #[serde(default)]
    pub memory: MemoryConfig,

    /// 合成参数配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 模型运行时配置
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// 运行时 sidecar 基础 URL
    #[serde(default = "default_runtime_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_runtime_timeout")]
    pub timeout_secs: u64,
}

fn default_runtime_url() -> String {
    "http://localhost:8100".to_string()
}

fn default_runtime_timeout() -> u64 {
    120
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            url: default_runtime_url(),
            timeout_secs: default_runtime_timeout(),
        }
    }
}

/// 模型缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 常驻模型数上限
    ///
    /// 最紧的部署配置为 1:每次换模型都先淘汰再加载
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// 内存阈值配置
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// 警告阈值（MB）
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold_mb: f64,

    /// 硬阈值（MB），超过立即拒绝请求
    #[serde(default = "default_hard_threshold")]
    pub hard_threshold_mb: f64,

    /// 警告区间内回收后的等待时间（毫秒），上限 1000
    #[serde(default = "default_admit_retry_wait")]
    pub admit_retry_wait_ms: u64,
}

fn default_warn_threshold() -> f64 {
    3072.0
}

fn default_hard_threshold() -> f64 {
    3584.0
}

fn default_admit_retry_wait() -> u64 {
    500
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            warn_threshold_mb: default_warn_threshold(),
            hard_threshold_mb: default_hard_threshold(),
            admit_retry_wait_ms: default_admit_retry_wait(),
        }
    }
}

/// 合成参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 最大文本长度（字符数）
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    /// 超长文本策略: reject 或 truncate
    #[serde(default)]
    pub text_policy: TextPolicy,

    /// 语速范围
    #[serde(default = "default_speed_min")]
    pub speed_min: f32,
    #[serde(default = "default_speed_max")]
    pub speed_max: f32,

    /// 音调范围
    #[serde(default = "default_pitch_min")]
    pub pitch_min: f32,
    #[serde(default = "default_pitch_max")]
    pub pitch_max: f32,

    /// 默认音色 ID
    #[serde(default = "default_voice")]
    pub default_voice: String,
}

fn default_max_text_len() -> usize {
    5000
}

fn default_speed_min() -> f32 {
    0.5
}

fn default_speed_max() -> f32 {
    2.0
}

fn default_pitch_min() -> f32 {
    0.5
}

fn default_pitch_max() -> f32 {
    2.0
}

fn default_voice() -> String {
    "female_calm".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_text_len: default_max_text_len(),
            text_policy: TextPolicy::default(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            pitch_min: default_pitch_min(),
            pitch_max: default_pitch_max(),
            default_voice: default_voice(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cache.capacity, 1);
        assert_eq!(config.synthesis.max_text_len, 5000);
        assert_eq!(config.synthesis.text_policy, TextPolicy::Reject);
        assert_eq!(config.synthesis.default_voice, "female_calm");
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_memory_defaults_are_ordered() {
        let config = MemoryConfig::default();
        assert!(config.warn_threshold_mb < config.hard_threshold_mb);
        assert!(config.admit_retry_wait_ms <= 1000);
    }
}
