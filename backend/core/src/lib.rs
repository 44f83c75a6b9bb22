pub mod engine_cell;
pub mod error;
pub mod outcome;
pub mod traits;
pub mod types;

pub use engine_cell::{EngineCell, EngineFactory};
pub use error::EngineError;
pub use outcome::OutcomeEnvelope;
pub use traits::RecognitionEngine;
pub use types::{ImageKind, LineRecord, Quad, RecognitionRequest, RecognitionResult};
