//! Model Runtime Adapters
//!
//! - `HttpModelRuntime`: 通过 HTTP 调用本机模型运行时 sidecar
//! - `FakeModelRuntime`: 测试替身，记录加载/释放事件

pub mod fake_runtime;
pub mod http_runtime;

pub use fake_runtime::{FakeModelRuntime, RuntimeEvent};
pub use http_runtime::{HttpModelRuntime, HttpModelRuntimeConfig};
