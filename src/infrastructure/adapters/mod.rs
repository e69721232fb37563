//! Infrastructure Adapters
//!
//! 外部模型运行时的具体实现

pub mod runtime;
