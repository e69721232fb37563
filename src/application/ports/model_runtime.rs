//! Model Runtime Port - 外部模型运行时抽象
//!
//! 模型运行时提供三个能力: load(model_key) -> Handle、
//! Handle 的合成调用、以及句柄释放。合成算法本身不在本系统范围内。
//!
//! 句柄释放采用 Drop 语义: 最后一个 `Arc` 被丢弃时释放模型，
//! 恰好释放一次，释放后的访问在结构上不可达。

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::ModelKey;

/// 模型运行时错误
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 一次合成调用的参数
///
/// speed/pitch 在进入端口之前已钳制到配置范围
#[derive(Debug, Clone)]
pub struct SynthesisParams {
    /// 规范化后的文本
    pub text: String,
    /// 多说话人模型的说话人 ID
    pub speaker: Option<String>,
    /// 语速
    pub speed: f32,
    /// 音调
    pub pitch: f32,
}

/// Model Runtime Port
///
/// 加载模型句柄的工厂。加载昂贵且占用大量内存，
/// 调用方（Model Cache）负责保证不重复的并发加载。
#[async_trait]
pub trait ModelRuntimePort: Send + Sync {
    /// 加载一个模型，返回可重复使用的句柄
    async fn load(&self, key: &ModelKey) -> Result<Arc<dyn ModelHandlePort>, RuntimeError>;
}

/// Model Handle Port
///
/// 已加载的模型。构建昂贵、重复使用廉价；
/// 释放发生在最后一个 Arc 被丢弃时（Drop 实现）。
#[async_trait]
pub trait ModelHandlePort: Send + Sync {
    /// 句柄对应的模型键
    fn model_key(&self) -> &ModelKey;

    /// 执行合成，把音频写入 `out_path`
    ///
    /// 输出文件由调用方以作用域方式管理，任何退出路径都会清理
    async fn synthesize_to(
        &self,
        params: SynthesisParams,
        out_path: &Path,
    ) -> Result<(), RuntimeError>;
}
