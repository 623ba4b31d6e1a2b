pub mod engine_trait;
pub mod null_engine;
pub mod registry;
pub mod rest_engine;

pub use engine_trait::SpeechEngine;
pub use null_engine::NullEngine;
pub use registry::EngineRegistry;
pub use rest_engine::RestEngine;
