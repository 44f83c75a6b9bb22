//! Structured logging for textgate.
//!
//! Console + rolling NDJSON file output, and one outcome event per request.

pub mod event_logger;
pub mod logger;

pub use event_logger::{log_outcome, OutcomeEvent};
pub use logger::init_logger;
