//! Call guard: bounded timeout, circuit breaker, per-class fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::error::RemoteError;

/// Guards every call to one remote dependency.
///
/// Cloning shares the breaker, so all call sites for the same
/// dependency trip and recover together.
#[derive(Debug, Clone)]
pub struct Guard {
    service: &'static str,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
}

impl Guard {
    /// Creates a guard for the named dependency.
    pub fn new(service: &'static str, timeout: Duration, breaker: CircuitBreaker) -> Self {
        Self {
            service,
            timeout,
            breaker: Arc::new(breaker),
        }
    }

    /// Returns the guarded dependency's name.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Returns the shared breaker, for observability.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Runs a strict-class call: every mutation, plus the buyer
    /// existence check.
    ///
    /// Fails fast with `Unavailable` while the breaker is open. The
    /// call itself is spawned onto the runtime: once issued, it runs to
    /// a definite success or typed failure and settles the breaker even
    /// if the originating request is cancelled and this future dropped.
    pub async fn strict<T, F>(&self, op: &'static str, call: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        if !self.breaker.admit() {
            metrics::counter!("remote_fail_fast_total", "service" => self.service).increment(1);
            tracing::warn!(service = self.service, op, "circuit open, failing fast");
            return Err(RemoteError::Unavailable {
                service: self.service,
                reason: "circuit open".to_string(),
            });
        }

        let service = self.service;
        let timeout = self.timeout;
        let breaker = self.breaker.clone();
        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Unavailable {
                    service,
                    reason: format!("no response within {timeout:?}"),
                }),
            };
            match &outcome {
                Err(err) if err.is_fault() => {
                    if breaker.record_failure() {
                        tracing::warn!(service, op, "circuit opened");
                    }
                }
                _ => breaker.record_success(),
            }
            outcome
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(RemoteError::Unavailable {
                service: self.service,
                reason: format!("call task failed: {join_err}"),
            }),
        }
    }

    /// Runs a degrading-class call: read-only aggregates.
    ///
    /// Any fault — open circuit, timeout, transport failure — yields the
    /// type's empty value so the surrounding request can degrade
    /// instead of failing.
    pub async fn degrading<T, F>(&self, op: &'static str, call: F) -> T
    where
        T: Default + Send + 'static,
        F: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        match self.strict(op, call).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    service = self.service,
                    op,
                    error = %err,
                    "read degraded to empty result"
                );
                T::default()
            }
        }
    }
}
