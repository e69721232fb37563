//! Application Ports
//!
//! 端口定义 - 外部协作方的抽象接口，具体实现在 infrastructure 层

pub mod memory_monitor;
pub mod model_runtime;

pub use memory_monitor::MemoryMonitorPort;
pub use model_runtime::{ModelHandlePort, ModelRuntimePort, RuntimeError, SynthesisParams};
