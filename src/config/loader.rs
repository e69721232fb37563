//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOCEL_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOCEL_SERVER__PORT=8080`
/// - `VOCEL_CACHE__CAPACITY=2`
/// - `VOCEL_MEMORY__HARD_THRESHOLD_MB=4096`
/// - `VOCEL_SYNTHESIS__TEXT_POLICY=truncate`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("runtime.url", "http://localhost:8100")?
        .set_default("runtime.timeout_secs", 120)?
        .set_default("cache.capacity", 1)?
        .set_default("memory.warn_threshold_mb", 3072.0)?
        .set_default("memory.hard_threshold_mb", 3584.0)?
        .set_default("memory.admit_retry_wait_ms", 500)?
        .set_default("synthesis.max_text_len", 5000)?
        .set_default("synthesis.text_policy", "reject")?
        .set_default("synthesis.speed_min", 0.5)?
        .set_default("synthesis.speed_max", 2.0)?
        .set_default("synthesis.pitch_min", 0.5)?
        .set_default("synthesis.pitch_max", 2.0)?
        .set_default("synthesis.default_voice", "female_calm")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），前缀 VOCEL_，层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix("VOCEL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.runtime.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model runtime URL cannot be empty".to_string(),
        ));
    }

    if config.cache.capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Cache capacity must be at least 1".to_string(),
        ));
    }

    if config.memory.warn_threshold_mb <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Memory warn threshold must be positive".to_string(),
        ));
    }

    if config.memory.warn_threshold_mb >= config.memory.hard_threshold_mb {
        return Err(ConfigError::ValidationError(
            "Memory warn threshold must be below hard threshold".to_string(),
        ));
    }

    // 准入重试等待是单个有界间隔，上限 1s
    if config.memory.admit_retry_wait_ms > 1000 {
        return Err(ConfigError::ValidationError(
            "Admission retry wait cannot exceed 1000ms".to_string(),
        ));
    }

    if config.synthesis.max_text_len == 0 {
        return Err(ConfigError::ValidationError(
            "Max text length must be positive".to_string(),
        ));
    }

    if config.synthesis.speed_min <= 0.0 || config.synthesis.speed_min > config.synthesis.speed_max
    {
        return Err(ConfigError::ValidationError(
            "Invalid speed bounds".to_string(),
        ));
    }

    if config.synthesis.pitch_min <= 0.0 || config.synthesis.pitch_min > config.synthesis.pitch_max
    {
        return Err(ConfigError::ValidationError(
            "Invalid pitch bounds".to_string(),
        ));
    }

    if config.synthesis.default_voice.is_empty() {
        return Err(ConfigError::ValidationError(
            "Default voice cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Model Runtime: {}", config.runtime.url);
    tracing::info!("Runtime Timeout: {}s", config.runtime.timeout_secs);
    tracing::info!("Cache Capacity: {}", config.cache.capacity);
    tracing::info!(
        "Memory Thresholds: warn {} MB / hard {} MB",
        config.memory.warn_threshold_mb,
        config.memory.hard_threshold_mb
    );
    tracing::info!("Admission Retry Wait: {}ms", config.memory.admit_retry_wait_ms);
    tracing::info!(
        "Text Limit: {} chars ({:?})",
        config.synthesis.max_text_len,
        config.synthesis.text_policy
    );
    tracing::info!(
        "Speed: {}..{}, Pitch: {}..{}",
        config.synthesis.speed_min,
        config.synthesis.speed_max,
        config.synthesis.pitch_min,
        config.synthesis.pitch_max
    );
    tracing::info!("Default Voice: {}", config.synthesis.default_voice);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
