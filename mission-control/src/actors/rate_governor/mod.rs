//! RateGovernor - keyed fixed-window rate limiting with a FIFO wait queue
//!
//! Every outbound call the mission engine makes is gated here. Callers that
//! exceed a key's window are not rejected: they wait in that key's queue and
//! are admitted, oldest first, as windows reset.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (governor, _handle) = RateGovernor::spawn(RateGovernorArguments::default()).await?;
//! let config = RateLimitConfig::new(10, 60_000);
//!
//! let answer = governor
//!     .execute_with_limit("mission.analyze", config, &cancel, || async {
//!         gateway.analyze(&objective, &context).await
//!     })
//!     .await?;
//! ```

pub mod actor;
pub mod protocol;
mod window;

use std::future::Future;

use mission_types::{RateLimitConfig, RateLimitDecision, RateLimitHeaders, RateWindowStatus};
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorRef};
use tokio_util::sync::CancellationToken;

pub use actor::{RateGovernorActor, RateGovernorArguments};
pub use protocol::{GovernorError, RateGovernorMsg};

/// Cloneable handle to the process-wide RateGovernorActor
#[derive(Debug, Clone)]
pub struct RateGovernor {
    actor: ActorRef<RateGovernorMsg>,
}

impl RateGovernor {
    /// Spawn a governor actor and return a handle to it
    pub async fn spawn(
        args: RateGovernorArguments,
    ) -> Result<(Self, JoinHandle<()>), GovernorError> {
        let (actor, handle) = Actor::spawn(None, RateGovernorActor, args)
            .await
            .map_err(|e| GovernorError::Unavailable(format!("failed to spawn governor: {e}")))?;
        Ok((Self { actor }, handle))
    }

    pub fn from_actor(actor: ActorRef<RateGovernorMsg>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<RateGovernorMsg> {
        &self.actor
    }

    /// Count one request against `key` and report whether it fits the window
    pub async fn check_limit(
        &self,
        key: &str,
        config: RateLimitConfig,
    ) -> Result<RateLimitDecision, GovernorError> {
        let key = key.to_string();
        ractor::call!(self.actor, |reply| RateGovernorMsg::CheckLimit {
            key,
            config,
            reply,
        })
        .map_err(|e| GovernorError::Unavailable(e.to_string()))
    }

    /// Wait until `key` admits one request, or `cancel` fires
    pub async fn acquire(
        &self,
        key: &str,
        config: RateLimitConfig,
        cancel: &CancellationToken,
    ) -> Result<RateLimitDecision, GovernorError> {
        let owned_key = key.to_string();
        let request = async {
            ractor::call!(self.actor, |reply| RateGovernorMsg::Acquire {
                key: owned_key,
                config,
                reply,
            })
        };

        tokio::select! {
            result = request => match result {
                Ok(admission) => admission,
                Err(e) => Err(GovernorError::Unavailable(e.to_string())),
            },
            _ = cancel.cancelled() => Err(GovernorError::Cancelled(key.to_string())),
        }
    }

    /// Run `call` once `key` admits it.
    ///
    /// If the window is full the call waits in the key's queue instead of
    /// failing; only governor faults and cancellation surface as errors.
    pub async fn execute_with_limit<T, E, F, Fut>(
        &self,
        key: &str,
        config: RateLimitConfig,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<GovernorError>,
    {
        let decision = self.acquire(key, config, cancel).await?;
        tracing::trace!(key = %key, remaining = decision.remaining, "Admitted by rate governor");
        call().await
    }

    /// Count one request and render the result as HTTP rate-limit headers
    pub async fn rate_limit_headers(
        &self,
        key: &str,
        config: RateLimitConfig,
    ) -> Result<RateLimitHeaders, GovernorError> {
        let decision = self.check_limit(key, config).await?;
        Ok(RateLimitHeaders::from_decision(&config, &decision))
    }

    /// Forget one key; anyone parked on it is rejected with `Cleared`
    pub fn clear_limit(&self, key: &str) -> Result<(), GovernorError> {
        self.actor
            .cast(RateGovernorMsg::ClearLimit {
                key: key.to_string(),
            })
            .map_err(|e| GovernorError::Unavailable(e.to_string()))
    }

    /// Forget every key
    pub fn clear_all(&self) -> Result<(), GovernorError> {
        self.actor
            .cast(RateGovernorMsg::ClearAll)
            .map_err(|e| GovernorError::Unavailable(e.to_string()))
    }

    pub async fn status(&self, key: &str) -> Result<Option<RateWindowStatus>, GovernorError> {
        let key = key.to_string();
        ractor::call!(self.actor, |reply| RateGovernorMsg::GetStatus { key, reply })
            .map_err(|e| GovernorError::Unavailable(e.to_string()))
    }
}
