//! Once-initialized holder for the recognition engine.
//!
//! The engine is expensive to build, so it is constructed at most once and
//! shared by every request. Construction either happens eagerly at startup
//! (`EngineCell::ready` / `EngineCell::preload`) or on first use from a
//! worker thread.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::traits::RecognitionEngine;
use crate::types::RecognitionResult;

/// Builds the engine. Called at most once per successful construction.
pub type EngineFactory =
    Box<dyn Fn() -> Result<Arc<dyn RecognitionEngine>, EngineError> + Send + Sync>;

pub struct EngineCell {
    engine: OnceCell<Arc<dyn RecognitionEngine>>,
    factory: Option<EngineFactory>,
}

impl EngineCell {
    /// A cell that constructs the engine on first access.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn RecognitionEngine>, EngineError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// A cell holding an already constructed engine.
    pub fn ready(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self {
            engine: OnceCell::with_value(engine),
            factory: None,
        }
    }

    /// Returns the engine, constructing it if needed.
    ///
    /// Concurrent first callers block on the same guard; only one runs the
    /// factory. A failed construction is not cached, so the next call
    /// retries.
    pub fn get(&self) -> Result<&Arc<dyn RecognitionEngine>, EngineError> {
        self.engine.get_or_try_init(|| {
            let factory = self
                .factory
                .as_ref()
                .ok_or_else(|| EngineError::Init("no engine factory configured".into()))?;
            info!("Initializing recognition engine");
            match factory() {
                Ok(engine) => {
                    info!(engine = engine.name(), "Recognition engine initialized");
                    Ok(engine)
                }
                Err(e) => {
                    warn!(error = %e, "Recognition engine initialization failed");
                    Err(e)
                }
            }
        })
    }

    /// Construct the engine now instead of on the first request.
    pub fn preload(&self) -> Result<(), EngineError> {
        self.get().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Run one blocking recognition call, constructing the engine first if needed.
    pub fn recognize(&self, image: &[u8]) -> Result<RecognitionResult, EngineError> {
        self.get()?.recognize(image)
    }
}
