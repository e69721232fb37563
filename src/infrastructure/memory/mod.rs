//! Memory Infrastructure
//!
//! 进程内存采样、回收提示与准入控制

pub mod admission;
pub mod monitor;

pub use admission::{Admission, AdmissionConfig, AdmissionController};
pub use monitor::ProcMemoryMonitor;
