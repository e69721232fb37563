//! Application State
//!
//! 进程级上下文对象:在启动时显式构建、在关闭时显式清理，
//! 通过 Arc 传入处理器，从不作为环境全局状态访问。

use std::sync::Arc;

use crate::application::{MemoryMonitorPort, SynthesisPipeline};
use crate::config::types::MemoryConfig;
use crate::domain::VoiceCatalog;
use crate::infrastructure::cache::ModelCache;
use crate::infrastructure::startup::ServiceStatus;

/// 应用状态
pub struct AppState {
    pub pipeline: SynthesisPipeline,
    pub cache: Arc<ModelCache>,
    pub monitor: Arc<dyn MemoryMonitorPort>,
    pub catalog: Arc<VoiceCatalog>,
    pub status: Arc<ServiceStatus>,
    pub memory_config: MemoryConfig,
}

impl AppState {
    pub fn new(
        pipeline: SynthesisPipeline,
        cache: Arc<ModelCache>,
        monitor: Arc<dyn MemoryMonitorPort>,
        catalog: Arc<VoiceCatalog>,
        status: Arc<ServiceStatus>,
        memory_config: MemoryConfig,
    ) -> Self {
        Self {
            pipeline,
            cache,
            monitor,
            catalog,
            status,
            memory_config,
        }
    }
}
