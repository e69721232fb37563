//! Domain Layer
//!
//! 领域层 - 音色目录与合成请求的核心类型

pub mod request;
pub mod voice;

pub use request::{SynthesisRequest, SynthesisResult, TextPolicy};
pub use voice::{ModelKey, VoiceCatalog, VoiceProfile};
