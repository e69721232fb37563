//! Application Layer
//!
//! 应用层 - 合成管线与端口定义

pub mod error;
pub mod pipeline;
pub mod ports;

pub use error::SynthesisError;
pub use pipeline::{PipelineConfig, SynthesisPipeline};
pub use ports::{
    MemoryMonitorPort, ModelHandlePort, ModelRuntimePort, RuntimeError, SynthesisParams,
};
