use std::future::Future;
use std::time::Duration;

use mission_types::RateLimitConfig;
use tokio_util::sync::CancellationToken;

use crate::actors::RateGovernor;
use crate::gateway::{GatewayError, SharedInferenceGateway};

/// What every stage needs to make a governed outbound call
#[derive(Clone)]
pub struct StageRuntime {
    pub governor: RateGovernor,
    pub gateway: SharedInferenceGateway,
    /// Deadline for one call once admitted; queue time is not counted
    pub call_timeout: Duration,
}

impl StageRuntime {
    pub fn new(
        governor: RateGovernor,
        gateway: SharedInferenceGateway,
        call_timeout: Duration,
    ) -> Self {
        Self {
            governor,
            gateway,
            call_timeout,
        }
    }

    /// Wait for admission under `key`, then run `call` under the call timeout.
    ///
    /// Cancellation is observed both while queued and while the call is in
    /// flight, and surfaces as an error for which `is_cancelled()` holds.
    pub(crate) async fn call_limited<T, F, Fut>(
        &self,
        key: &str,
        limit: RateLimitConfig,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let timeout = self.call_timeout;
        self.governor
            .execute_with_limit(key, limit, cancel, move || async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(GatewayError::Cancelled),
                    outcome = tokio::time::timeout(timeout, call()) => match outcome {
                        Ok(result) => result,
                        Err(_) => Err(GatewayError::Timeout(timeout.as_millis() as u64)),
                    },
                }
            })
            .await
    }
}
