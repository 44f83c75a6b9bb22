use crate::types::RecognitionResult;

/// How the processing of one request ended.
///
/// Created once at the end of `Gateway::handle_request` and consumed by the
/// response mapper.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeEnvelope {
    Success(RecognitionResult),
    /// The payload was rejected before admission. Never retried automatically.
    ValidationFailure(String),
    /// No permit was free. Safe to retry later.
    Overloaded,
    /// The deadline passed. The engine call may still be running.
    Timeout,
    EngineFailure(String),
    InternalFailure(String),
}

impl OutcomeEnvelope {
    /// Stable snake_case tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OutcomeEnvelope::Success(_) => "success",
            OutcomeEnvelope::ValidationFailure(_) => "validation_failure",
            OutcomeEnvelope::Overloaded => "overloaded",
            OutcomeEnvelope::Timeout => "timeout",
            OutcomeEnvelope::EngineFailure(_) => "engine_failure",
            OutcomeEnvelope::InternalFailure(_) => "internal_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeEnvelope::Success(_))
    }

    /// Failure reason, if this outcome carries one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            OutcomeEnvelope::ValidationFailure(r)
            | OutcomeEnvelope::EngineFailure(r)
            | OutcomeEnvelope::InternalFailure(r) => Some(r),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&RecognitionResult> {
        match self {
            OutcomeEnvelope::Success(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let all = [
            OutcomeEnvelope::Success(RecognitionResult::empty()),
            OutcomeEnvelope::ValidationFailure("x".into()),
            OutcomeEnvelope::Overloaded,
            OutcomeEnvelope::Timeout,
            OutcomeEnvelope::EngineFailure("x".into()),
            OutcomeEnvelope::InternalFailure("x".into()),
        ];
        let mut kinds: Vec<_> = all.iter().map(OutcomeEnvelope::kind).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), all.len());
    }

    #[test]
    fn reason_only_on_failures_with_messages() {
        assert_eq!(OutcomeEnvelope::EngineFailure("boom".into()).reason(), Some("boom"));
        assert_eq!(OutcomeEnvelope::Overloaded.reason(), None);
        assert!(OutcomeEnvelope::Success(RecognitionResult::empty()).result().is_some());
    }
}
