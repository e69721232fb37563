//! HTTP Handlers
//!
//! 各端点处理器

pub mod health;
pub mod speech;
pub mod voice;

pub use health::{cleanup, health, memory, service_info};
pub use speech::generate_speech;
pub use voice::list_voices;
