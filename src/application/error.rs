//! 应用层错误定义
//!
//! 合成管线的错误分类。验证错误立即返回；
//! ModelLoadFailed / GenerationFailed 携带诊断信息且不影响进程，
//! 缓存保持一致，后续同 key 请求可以重试；
//! 任何未分类的故障在管线边界映射为 InternalError，不向外传播。

use thiserror::Error;

use crate::infrastructure::cache::CacheError;

/// 合成管线错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 输入无效（空文本、超长文本等）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 服务未就绪（音色目录为空等启动配置问题）
    #[error("Service not ready: {0}")]
    ServiceNotReady(String),

    /// 内存压力过大，请求被拒绝
    #[error("Server overloaded: {0}")]
    Overloaded(String),

    /// 模型加载失败
    #[error("Failed to load TTS model: {0}")]
    ModelLoadFailed(String),

    /// 合成失败或产生空输出
    #[error("Speech generation failed: {0}")]
    GenerationFailed(String),

    /// 兜底错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SynthesisError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        Self::Overloaded(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<CacheError> for SynthesisError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::LoadFailed { .. } => Self::ModelLoadFailed(err.to_string()),
        }
    }
}

impl From<std::io::Error> for SynthesisError {
    fn from(err: std::io::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}
