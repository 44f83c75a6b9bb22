//! Request orchestration.
//!
//! validate -> admit -> dispatch -> wait with deadline -> release -> map.
//! Every request settles as exactly one [`OutcomeEnvelope`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use textgate_config::TextGateConfig;
use textgate_core::{EngineCell, ImageKind, OutcomeEnvelope};
use textgate_executor::{DispatchError, DispatchPool};
use textgate_logging::log_outcome;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::admission::AdmissionController;
use crate::validation::ImageValidator;

/// Capacity and deadline settings for a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayLimits {
    pub max_concurrency: usize,
    pub pool_size: usize,
    pub timeout: Duration,
    pub max_payload_bytes: usize,
    pub allowed_formats: Vec<ImageKind>,
}

impl GatewayLimits {
    pub fn from_config(config: &TextGateConfig) -> Self {
        Self {
            max_concurrency: config.recognition.max_concurrency,
            pool_size: config.recognition.pool_size(),
            timeout: config.recognition.timeout(),
            max_payload_bytes: config.validation.max_payload_bytes,
            allowed_formats: config.validation.allowed_kinds(),
        }
    }
}

pub struct Gateway {
    validator: ImageValidator,
    admission: AdmissionController,
    pool: DispatchPool,
    engine: Arc<EngineCell>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(limits: GatewayLimits, engine: Arc<EngineCell>) -> Self {
        info!(
            max_concurrency = limits.max_concurrency,
            pool_size = limits.pool_size,
            timeout_ms = limits.timeout.as_millis() as u64,
            max_payload_bytes = limits.max_payload_bytes,
            "Recognition gateway configured"
        );
        Self {
            validator: ImageValidator::new(limits.max_payload_bytes, limits.allowed_formats),
            admission: AdmissionController::new(limits.max_concurrency),
            pool: DispatchPool::new(limits.pool_size),
            engine,
            timeout: limits.timeout,
        }
    }

    pub fn from_config(config: &TextGateConfig, engine: Arc<EngineCell>) -> Self {
        Self::new(GatewayLimits::from_config(config), engine)
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn pool(&self) -> &DispatchPool {
        &self.pool
    }

    pub fn engine(&self) -> &EngineCell {
        &self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stop accepting work. Calls already running are left to finish.
    pub fn shutdown(&self) {
        self.pool.close();
        info!(busy = self.pool.busy(), "Recognition gateway shut down");
    }

    /// Run one recognition request end to end.
    pub async fn handle_request(&self, payload: Vec<u8>) -> OutcomeEnvelope {
        let request_id = Uuid::new_v4();
        let span = info_span!("recognize", request_id = %request_id);
        let payload_bytes = payload.len();
        let started = Instant::now();

        let outcome = self.process(payload).instrument(span.clone()).await;

        span.in_scope(|| log_outcome(request_id, payload_bytes, &outcome, started.elapsed()));
        outcome
    }

    async fn process(&self, payload: Vec<u8>) -> OutcomeEnvelope {
        let request = match self.validator.validate(payload) {
            Ok(request) => request,
            Err(e) => return OutcomeEnvelope::ValidationFailure(e.to_string()),
        };

        let Some(permit) = self.admission.try_acquire() else {
            return OutcomeEnvelope::Overloaded;
        };

        let engine = Arc::clone(&self.engine);
        let handle = self.pool.submit(move || engine.recognize(request.bytes()));
        let settled = self.pool.wait(handle, self.timeout).await;
        permit.release();
        debug!(available = self.admission.available(), "Permit released");

        match settled {
            Ok(result) => OutcomeEnvelope::Success(result),
            Err(DispatchError::Failed(e)) => OutcomeEnvelope::EngineFailure(e.to_string()),
            Err(DispatchError::TimedOut(_)) => OutcomeEnvelope::Timeout,
            Err(DispatchError::Panicked(message)) => {
                OutcomeEnvelope::InternalFailure(format!("recognition task panicked: {message}"))
            }
            Err(DispatchError::Closed) => {
                OutcomeEnvelope::InternalFailure("recognition pool is shut down".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gif_bytes, png_bytes, until, Gate, ScriptedEngine};
    use textgate_core::{EngineError, RecognitionEngine};

    fn limits(max_concurrency: usize, timeout: Duration) -> GatewayLimits {
        GatewayLimits {
            max_concurrency,
            pool_size: max_concurrency,
            timeout,
            max_payload_bytes: 4096,
            allowed_formats: vec![ImageKind::Jpeg, ImageKind::Png, ImageKind::Bmp],
        }
    }

    fn gateway(engine: &Arc<ScriptedEngine>, limits: GatewayLimits) -> Arc<Gateway> {
        let engine: Arc<dyn RecognitionEngine> = engine.clone();
        Arc::new(Gateway::new(limits, Arc::new(EngineCell::ready(engine))))
    }

    #[tokio::test]
    async fn single_line_image_succeeds() {
        let engine = Arc::new(ScriptedEngine::line("HELLO WORLD"));
        let gw = gateway(&engine, limits(2, Duration::from_secs(5)));

        let outcome = gw.handle_request(png_bytes(64, 24)).await;
        let result = outcome.result().expect("success");
        assert_eq!(result.plain_text(), "HELLO WORLD");
        assert_eq!(result.detailed().len(), 1);
        let confidence = result.detailed()[0].confidence();
        assert!((0.0..=1.0).contains(&confidence));
        assert_eq!(gw.admission().available(), 2);
    }

    #[tokio::test]
    async fn empty_payload_touches_nothing() {
        let engine = Arc::new(ScriptedEngine::line("x"));
        let gw = gateway(&engine, limits(2, Duration::from_secs(5)));

        let outcome = gw.handle_request(Vec::new()).await;
        assert!(matches!(outcome, OutcomeEnvelope::ValidationFailure(_)));
        assert_eq!(gw.admission().admitted_total(), 0);
        assert_eq!(gw.admission().rejected_total(), 0);
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn payload_limit_boundary() {
        let engine = Arc::new(ScriptedEngine::line("x"));
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));

        let mut exact = png_bytes(8, 8);
        exact.resize(4096, 0);
        assert!(gw.handle_request(exact.clone()).await.is_success());

        exact.push(0);
        match gw.handle_request(exact).await {
            OutcomeEnvelope::ValidationFailure(reason) => assert!(reason.contains("4097")),
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_payloads_are_validation_failures() {
        let engine = Arc::new(ScriptedEngine::line("x"));
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));

        for payload in [b"definitely not an image".to_vec(), gif_bytes()] {
            let outcome = gw.handle_request(payload).await;
            assert_eq!(outcome.kind(), "validation_failure");
        }
        assert_eq!(engine.calls(), 0);
        assert_eq!(gw.admission().admitted_total(), 0);
    }

    #[tokio::test]
    async fn engine_error_releases_permit() {
        let engine = Arc::new(ScriptedEngine::failing("model exploded"));
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));

        match gw.handle_request(png_bytes(8, 8)).await {
            OutcomeEnvelope::EngineFailure(reason) => assert!(reason.contains("model exploded")),
            other => panic!("expected engine failure, got {other:?}"),
        }
        assert_eq!(gw.admission().available(), 1);
    }

    #[tokio::test]
    async fn panic_is_internal_failure() {
        let engine = Arc::new(ScriptedEngine::panicking());
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));

        match gw.handle_request(png_bytes(8, 8)).await {
            OutcomeEnvelope::InternalFailure(reason) => {
                assert!(reason.contains("scripted engine panic"))
            }
            other => panic!("expected internal failure, got {other:?}"),
        }
        assert_eq!(gw.admission().available(), 1);
        assert_eq!(gw.pool().busy(), 0);
    }

    #[tokio::test]
    async fn engine_construction_failure_is_engine_failure() {
        let cell = EngineCell::lazy(|| Err(EngineError::Init("no tessdata".into())));
        let gw = Gateway::new(limits(1, Duration::from_secs(5)), Arc::new(cell));

        match gw.handle_request(png_bytes(8, 8)).await {
            OutcomeEnvelope::EngineFailure(reason) => assert!(reason.contains("no tessdata")),
            other => panic!("expected engine failure, got {other:?}"),
        }
        assert_eq!(gw.admission().available(), 1);
        assert!(!gw.engine().is_initialized());
    }

    #[tokio::test]
    async fn timeout_returns_promptly_and_frees_permit() {
        let gate = Gate::default();
        let engine = Arc::new(ScriptedEngine::line("late").gated(&gate));
        let gw = gateway(&engine, limits(2, Duration::from_millis(100)));

        let started = Instant::now();
        let outcome = gw.handle_request(png_bytes(8, 8)).await;
        let waited = started.elapsed();

        assert!(matches!(outcome, OutcomeEnvelope::Timeout));
        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_secs(1), "waited {waited:?}");
        assert_eq!(gw.admission().available(), 2);
        // The call itself is still running on its worker.
        assert_eq!(engine.in_flight(), 1);
        assert_eq!(gw.pool().abandoned(), 1);

        gate.open();
        until(|| engine.completed() == 1).await;
        until(|| gw.pool().abandoned() == 0).await;
    }

    #[tokio::test]
    async fn rejects_immediately_when_saturated() {
        let gate = Gate::default();
        let engine = Arc::new(ScriptedEngine::line("ok").gated(&gate));
        let gw = gateway(&engine, limits(2, Duration::from_secs(5)));

        let running: Vec<_> = (0..2)
            .map(|_| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.handle_request(png_bytes(8, 8)).await })
            })
            .collect();
        until(|| engine.in_flight() == 2).await;

        let started = Instant::now();
        let outcome = gw.handle_request(png_bytes(8, 8)).await;
        assert!(matches!(outcome, OutcomeEnvelope::Overloaded));
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(gw.admission().rejected_total(), 1);

        gate.open();
        for task in running {
            assert!(task.await.unwrap().is_success());
        }
        assert_eq!(gw.admission().available(), 2);
    }

    #[tokio::test]
    async fn single_permit_scenario() {
        let gate = Gate::default();
        let engine = Arc::new(ScriptedEngine::line("ok").gated(&gate));
        let gw = gateway(&engine, limits(1, Duration::from_millis(300)));

        let first = {
            let gw = Arc::clone(&gw);
            tokio::spawn(async move { gw.handle_request(png_bytes(8, 8)).await })
        };
        until(|| engine.in_flight() == 1).await;

        let second = gw.handle_request(png_bytes(8, 8)).await;
        assert!(matches!(second, OutcomeEnvelope::Overloaded));

        assert!(matches!(first.await.unwrap(), OutcomeEnvelope::Timeout));
        assert_eq!(gw.admission().available(), 1);

        gate.open();
        until(|| engine.completed() == 1 && gw.pool().busy() == 0).await;

        let third = gw.handle_request(png_bytes(8, 8)).await;
        assert!(third.is_success());
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn conserves_permits_under_load() {
        let engine = Arc::new(ScriptedEngine::line("ok").holding(Duration::from_millis(30)));
        let gw = gateway(&engine, limits(3, Duration::from_secs(5)));

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.handle_request(png_bytes(8, 8)).await })
            })
            .collect();

        let mut succeeded = 0;
        let mut overloaded = 0;
        for task in tasks {
            match task.await.unwrap() {
                OutcomeEnvelope::Success(_) => succeeded += 1,
                OutcomeEnvelope::Overloaded => overloaded += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(succeeded + overloaded, 12);
        assert!(succeeded >= 1);
        assert!(engine.peak() <= 3, "peak {}", engine.peak());
        assert_eq!(gw.admission().available(), 3);
        assert_eq!(gw.admission().admitted_total(), succeeded as u64);
        assert_eq!(gw.admission().rejected_total(), overloaded as u64);
    }

    #[tokio::test]
    async fn cancelled_request_returns_permit() {
        let gate = Gate::default();
        let engine = Arc::new(ScriptedEngine::line("ok").gated(&gate));
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));

        let task = {
            let gw = Arc::clone(&gw);
            tokio::spawn(async move { gw.handle_request(png_bytes(8, 8)).await })
        };
        until(|| engine.in_flight() == 1).await;
        assert_eq!(gw.admission().available(), 0);

        task.abort();
        until(|| gw.admission().available() == 1).await;
        until(|| gw.pool().abandoned() == 1).await;

        gate.open();
        until(|| engine.completed() == 1).await;
        until(|| gw.pool().abandoned() == 0).await;
    }

    #[tokio::test]
    async fn shutdown_fails_new_work_internally() {
        let engine = Arc::new(ScriptedEngine::line("ok"));
        let gw = gateway(&engine, limits(1, Duration::from_secs(5)));
        gw.shutdown();

        let outcome = gw.handle_request(png_bytes(8, 8)).await;
        assert_eq!(outcome.kind(), "internal_failure");
        assert_eq!(gw.admission().available(), 1);
        assert_eq!(engine.calls(), 0);
    }
}
