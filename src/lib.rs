// Public modules
pub mod chat;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod observability;
pub mod render;

// Re-exports
pub use engine::{Engine, EngineHandle, EngineParams, EventSink, GenerationEvent};
pub use error::{Error, Result};
pub use observability::register_biometrics;
