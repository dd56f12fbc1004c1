//! The circuit breaker: shared mutable state wrapping an
//! `LlmProvider`, independent of any concrete vendor. Three consecutive
//! failures trip it open; after the recovery timeout it allows one
//! probe call through (half-open) before returning to closed or open.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use veritas_config::CircuitBreakerConfig;

use crate::error::LlmError;
use crate::provider::{GenerateRequest, LlmProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerState {
    state: State,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Wraps any `LlmProvider` with the closed/open/half-open state machine.
/// The breaker observes one outcome per `generate`/`generate_json` call
/// (the wrapped provider already retried internally), never per attempt.
pub struct CircuitBreaker<P> {
    inner: P,
    failure_threshold: u32,
    recovery_timeout: Duration,
    state: Mutex<BreakerState>,
}

impl<P: LlmProvider> CircuitBreaker<P> {
    pub fn new(inner: P, config: &CircuitBreakerConfig) -> Self {
        Self {
            inner,
            failure_threshold: config.failure_threshold,
            recovery_timeout: config.recovery_timeout(),
            state: Mutex::new(BreakerState {
                state: State::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// True if the call should be allowed through right now; transitions
    /// `Open -> HalfOpen` as a side effect once the recovery timeout has
    /// elapsed.
    fn admit(&self) -> bool {
        let mut guard = self.state.lock();
        match guard.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let elapsed = guard.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.recovery_timeout {
                    guard.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut guard = self.state.lock();
        guard.state = State::Closed;
        guard.consecutive_failures = 0;
        guard.opened_at = None;
    }

    fn record_failure(&self) {
        let mut guard = self.state.lock();
        match guard.state {
            State::HalfOpen => {
                guard.state = State::Open;
                guard.opened_at = Some(Instant::now());
            }
            State::Closed => {
                guard.consecutive_failures += 1;
                if guard.consecutive_failures >= self.failure_threshold {
                    guard.state = State::Open;
                    guard.opened_at = Some(Instant::now());
                }
            }
            State::Open => {}
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        matches!(self.state.lock().state, State::Open)
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for CircuitBreaker<P> {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        if !self.admit() {
            return Err(LlmError::CircuitOpen);
        }
        match self.inner.generate(request).await {
            Ok(text) => {
                self.record_success();
                Ok(text)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    async fn generate_json(&self, request: GenerateRequest) -> Result<Value, LlmError> {
        if !self.admit() {
            return Err(LlmError::CircuitOpen);
        }
        match self.inner.generate_json(request).await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Convenience alias for the common case: a breaker around a
/// type-erased provider shared across callers.
pub type SharedProvider = Arc<dyn LlmProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl LlmProvider for AlwaysFails {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, LlmError> {
            Err(LlmError::Network("boom".to_string()))
        }

        fn model_name(&self) -> &str {
            "always-fails"
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl LlmProvider for AlwaysSucceeds {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, LlmError> {
            Ok("ok".to_string())
        }

        fn model_name(&self) -> &str {
            "always-succeeds"
        }
    }

    fn config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout_secs: 60,
        }
    }

    #[tokio::test]
    async fn opens_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(AlwaysFails, &config(3));
        for _ in 0..3 {
            let _ = breaker.generate(GenerateRequest::new("x", 0.2)).await;
        }
        assert!(breaker.is_open());
    }

    #[tokio::test]
    async fn fails_fast_while_open() {
        let breaker = CircuitBreaker::new(AlwaysFails, &config(1));
        let _ = breaker.generate(GenerateRequest::new("x", 0.2)).await;
        assert!(breaker.is_open());
        let result = breaker.generate(GenerateRequest::new("x", 0.2)).await;
        assert!(matches!(result, Err(LlmError::CircuitOpen)));
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(AlwaysSucceeds, &config(3));
        let result = breaker.generate(GenerateRequest::new("x", 0.2)).await;
        assert!(result.is_ok());
        assert!(!breaker.is_open());
    }
}
