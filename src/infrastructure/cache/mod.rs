//! Model Cache Infrastructure
//!
//! 有界模型句柄缓存

pub mod model_cache;

pub use model_cache::{CacheError, CacheStats, ModelCache, ModelCacheConfig};
