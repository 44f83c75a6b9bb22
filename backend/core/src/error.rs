use thiserror::Error;

/// Failures raised by a recognition engine.
///
/// All variants are request-scoped: they end one request, never the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine initialization failed: {0}")]
    Init(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
}
