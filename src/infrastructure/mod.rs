//! Infrastructure Layer
//!
//! 基础设施层 - HTTP、缓存、内存监控、运行时适配器与启动任务

pub mod adapters;
pub mod cache;
pub mod http;
pub mod memory;
pub mod startup;
