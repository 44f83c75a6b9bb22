use crate::error::EngineError;
use crate::types::RecognitionResult;

/// An opaque text recognition capability over encoded image bytes.
///
/// `recognize` is blocking and CPU-bound; callers must run it off the async
/// runtime. Implementations are shared across worker threads, so any
/// internal state must be synchronized by the implementation itself. An
/// engine that cannot run concurrently must be deployed with a single
/// worker slot.
pub trait RecognitionEngine: Send + Sync {
    /// Human-readable engine name (e.g., "tesseract").
    fn name(&self) -> &str;

    /// Recognize all text lines in the image, in detection order.
    fn recognize(&self, image: &[u8]) -> Result<RecognitionResult, EngineError>;
}
