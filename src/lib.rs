//! Vocel - 内存受限的 TTS 推理服务
//!
//! 在硬内存上限下服务文本合成请求的资源生命周期核心:
//!
//! 领域层 (domain/):
//! - 音色目录、模型键、合成请求/结果
//!
//! 应用层 (application/):
//! - Ports: ModelRuntimePort / ModelHandlePort / MemoryMonitorPort
//! - Pipeline: 规范化 -> 准入 -> 缓存获取 -> 合成
//!
//! 基础设施层 (infrastructure/):
//! - Cache: 有界 LRU 模型句柄缓存（单锁、先回收后增长）
//! - Memory: 进程 RSS 采样、回收提示、准入控制
//! - Adapters: HTTP 模型运行时 + 测试替身
//! - HTTP: RESTful API
//! - Startup: 默认模型预加载与就绪状态

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
