//! Configuration
//!
//! 配置加载与类型定义

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::AppConfig;
