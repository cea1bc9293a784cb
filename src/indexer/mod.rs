pub mod engine;
pub mod session;

pub use engine::IndexingEngine;
pub use session::{EnginePhase, IndexingSession};
