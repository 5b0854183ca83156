//! Resilient call wrapper
//!
//! Runs one remote operation with:
//! - Quota admission before the first attempt (hard stop, never retried)
//! - Global cooldown wait while the rate-limit circuit is open
//! - Process-wide pacing between attempts
//! - Exponential backoff with jitter for rate-limit and overload failures
//!
//! There is no operation timeout and no cancellation; callers that need
//! either must race `execute` against their own timer.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};

use crate::errors::{ClinicalError, Result};
use crate::quota::QuotaGovernor;
use crate::resilience::circuit::SharedCallState;
use crate::resilience::types::{CircuitStatus, FailureClass, ResilienceConfig, JITTER_MAX, JITTER_MIN};
use crate::telemetry::{CallEvent, TelemetryCollector};

/// Wraps remote calls with quota admission, pacing and classified retry
#[derive(Clone)]
pub struct ResilientCaller {
    config: ResilienceConfig,
    governor: Arc<QuotaGovernor>,
    shared: Arc<SharedCallState>,
    telemetry: Option<TelemetryCollector>,
}

impl ResilientCaller {
    /// Create caller on the process-wide circuit and pacing state
    pub fn new(governor: Arc<QuotaGovernor>) -> Self {
        Self::with_config(governor, ResilienceConfig::default())
    }

    /// Create caller with custom settings on the process-wide state
    pub fn with_config(governor: Arc<QuotaGovernor>, config: ResilienceConfig) -> Self {
        Self::with_shared_state(governor, config, SharedCallState::global())
    }

    /// Create caller on an explicit shared state
    pub fn with_shared_state(
        governor: Arc<QuotaGovernor>,
        config: ResilienceConfig,
        shared: Arc<SharedCallState>,
    ) -> Self {
        Self {
            config,
            governor,
            shared,
            telemetry: None,
        }
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Execute operation with admission control and retry
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_usage(move || {
            let attempt = operation();
            async move { attempt.await.map(|value| (value, None)) }
        })
        .await
    }

    /// Execute an operation that also reports token usage on success
    pub async fn execute_with_usage<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, Option<u64>)>>,
    {
        let admission = self.governor.check_before_call();
        if !admission.allowed {
            let reason = admission
                .reason
                .unwrap_or_else(|| "Daily API quota reached.".to_string());
            self.emit(CallEvent::QuotaRejected {
                reason: reason.clone(),
                timestamp: Instant::now(),
            });
            return Err(ClinicalError::QuotaExceeded { reason });
        }

        if let Some(warning) = admission.warning {
            tracing::warn!(warning = %warning, "API quota warning");
            self.emit(CallEvent::QuotaWarning {
                message: warning,
                timestamp: Instant::now(),
            });
        }

        self.wait_for_cooldown().await;

        let started = Instant::now();
        let mut attempt = 0;

        loop {
            self.pace().await;
            self.emit(CallEvent::AttemptStarted {
                attempt,
                timestamp: Instant::now(),
            });

            let error = match operation().await {
                Ok((value, tokens)) => {
                    self.governor.record_call(tokens);
                    self.emit(CallEvent::CallSucceeded {
                        attempts: attempt + 1,
                        duration_ms: started.elapsed().as_millis() as u64,
                        timestamp: Instant::now(),
                    });
                    return Ok(value);
                }
                Err(e) => e,
            };

            let class = FailureClass::classify(&error.to_string());
            if !class.is_retryable() {
                return Err(self.fail(attempt, error));
            }

            if attempt >= self.config.max_retries {
                let terminal = match class {
                    FailureClass::RateLimited => {
                        let cooldown = self.config.cooldown();
                        self.shared.circuit.open(cooldown);
                        tracing::warn!(
                            cooldown_secs = cooldown.as_secs(),
                            attempts = attempt + 1,
                            "Rate limit retries exhausted, opening circuit"
                        );
                        self.emit(CallEvent::CircuitOpened {
                            cooldown_ms: cooldown.as_millis() as u64,
                            timestamp: Instant::now(),
                        });
                        ClinicalError::RateLimited
                    }
                    _ => ClinicalError::ServiceOverloaded,
                };
                tracing::warn!(error = %error, "Giving up after {} attempts", attempt + 1);
                return Err(self.fail(attempt, terminal));
            }

            let delay = self.backoff_delay(attempt);
            tracing::warn!(
                class = ?class,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying API call"
            );
            self.emit(CallEvent::RetryScheduled {
                attempt,
                class,
                delay_ms: delay.as_millis() as u64,
                timestamp: Instant::now(),
            });
            sleep(delay).await;

            attempt += 1;
        }
    }

    /// Backoff before retry `attempt + 1`: base * 2^attempt, jittered
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay_ms(attempt);
        let factor = if self.config.jitter {
            rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX)
        } else {
            1.0
        };
        Duration::from_millis((base_ms as f64 * factor).round() as u64)
    }

    /// Longest possible total backoff for one call
    pub fn max_total_backoff(&self) -> Duration {
        let factor = if self.config.jitter { JITTER_MAX } else { 1.0 };
        let total_ms: u64 = (0..self.config.max_retries)
            .map(|attempt| self.base_delay_ms(attempt))
            .sum();
        Duration::from_millis((total_ms as f64 * factor).round() as u64)
    }

    /// Current rate-limit circuit status
    pub fn circuit_status(&self) -> CircuitStatus {
        self.shared.circuit.status()
    }

    /// Get configuration
    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// Quota governor used for admission
    pub fn governor(&self) -> &Arc<QuotaGovernor> {
        &self.governor
    }

    fn base_delay_ms(&self, attempt: u32) -> u64 {
        self.config
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
    }

    async fn wait_for_cooldown(&self) {
        if let Some(until) = self.shared.circuit.pending_cooldown() {
            let remaining = until.saturating_duration_since(Instant::now());
            tracing::info!(
                remaining_ms = remaining.as_millis() as u64,
                "Rate limit cooldown active, waiting before calling"
            );
            sleep_until(until).await;
            self.emit(CallEvent::CooldownWaited {
                waited_ms: remaining.as_millis() as u64,
                timestamp: Instant::now(),
            });
        }
        self.shared.circuit.close();
    }

    async fn pace(&self) {
        let wait = self.shared.pacing.reserve(self.config.min_request_interval());
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Pacing API request");
            sleep(wait).await;
        }
    }

    fn fail(&self, attempt: u32, error: ClinicalError) -> ClinicalError {
        self.emit(CallEvent::CallFailed {
            attempts: attempt + 1,
            error: error.to_string(),
            timestamp: Instant::now(),
        });
        error
    }

    fn emit(&self, event: CallEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaConfig;
    use std::sync::Mutex;

    fn caller(config: ResilienceConfig) -> ResilientCaller {
        let governor = Arc::new(QuotaGovernor::in_memory(QuotaConfig::default()));
        ResilientCaller::with_shared_state(governor, config, Arc::new(SharedCallState::new()))
    }

    fn no_jitter() -> ResilienceConfig {
        ResilienceConfig {
            jitter: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_backoff_without_jitter() {
        let caller = caller(no_jitter());
        assert_eq!(caller.backoff_delay(0), Duration::from_millis(2000));
        assert_eq!(caller.backoff_delay(1), Duration::from_millis(4000));
        assert_eq!(caller.backoff_delay(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let caller = caller(ResilienceConfig::default());
        for _ in 0..200 {
            let delay = caller.backoff_delay(1);
            assert!(delay >= Duration::from_millis(3000), "{:?}", delay);
            assert!(delay <= Duration::from_millis(5000), "{:?}", delay);
        }
    }

    #[test]
    fn test_max_total_backoff() {
        assert_eq!(caller(no_jitter()).max_total_backoff(), Duration::from_secs(14));
        assert_eq!(
            caller(ResilienceConfig::default()).max_total_backoff(),
            Duration::from_millis(17500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_overload_retries() {
        let caller = caller(no_jitter());
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result = caller
            .execute(move || {
                let count = count.clone();
                async move {
                    let mut n = count.lock().unwrap();
                    *n += 1;
                    if *n < 3 {
                        Err(ClinicalError::Upstream("503 model overloaded".to_string()))
                    } else {
                        Ok("summary")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "summary");
        assert_eq!(*attempts.lock().unwrap(), 3);
        assert_eq!(caller.governor().get_summary().calls_used, 1);
        assert!(!caller.circuit_status().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_exhaustion_keeps_circuit_closed() {
        let caller = caller(no_jitter());
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result: Result<()> = caller
            .execute(move || {
                let count = count.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Err(ClinicalError::Upstream("The service is UNAVAILABLE".to_string()))
                }
            })
            .await;

        assert!(matches!(result, Err(ClinicalError::ServiceOverloaded)));
        assert_eq!(*attempts.lock().unwrap(), 4);
        assert!(!caller.circuit_status().is_open);
        assert_eq!(caller.governor().get_summary().calls_used, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_usage_tokens_are_recorded() {
        let caller = caller(no_jitter());
        let value = caller
            .execute_with_usage(|| async { Ok((42, Some(1200))) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        let summary = caller.governor().get_summary();
        assert_eq!(summary.calls_used, 1);
        assert_eq!(summary.tokens_used, 1200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhausted_skips_operation() {
        let governor = Arc::new(QuotaGovernor::in_memory(QuotaConfig {
            daily_limit: 2,
            ..Default::default()
        }));
        governor.record_call(None);
        governor.record_call(None);
        let telemetry = TelemetryCollector::new();
        let caller = ResilientCaller::with_shared_state(governor, no_jitter(), Arc::new(SharedCallState::new()))
            .with_telemetry(telemetry.clone());

        let invoked = Arc::new(Mutex::new(false));
        let flag = invoked.clone();
        let result = caller
            .execute(move || {
                let flag = flag.clone();
                async move {
                    *flag.lock().unwrap() = true;
                    Ok(())
                }
            })
            .await;

        match result {
            Err(ClinicalError::QuotaExceeded { reason }) => assert!(reason.contains("2/2")),
            other => panic!("Expected QuotaExceeded, got {:?}", other),
        }
        assert!(!*invoked.lock().unwrap());
        assert_eq!(telemetry.get_stats().quota_rejections, 1);
    }
}
