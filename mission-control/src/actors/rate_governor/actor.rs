//! RateGovernorActor - single owner of every rate-limit window
//!
//! The RateGovernorActor is responsible for:
//! - Fixed-window admission checks per key
//! - Parking callers that exceed their window in a per-key FIFO queue
//! - Arming exactly one drain timer per key while anyone is parked
//! - Evicting idle windows on a sweep interval
//!
//! All window state lives in this actor's state and is only touched from
//! `handle`, so "arm a drain if none is armed" cannot race.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mission_types::RateLimitConfig;
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{debug, info, warn};

use super::protocol::{AdmissionReply, GovernorError, RateGovernorMsg};
use super::window::{wait_until_expired, RateWindow, RateWindows};

/// Default cap on callers parked behind a single key
pub const DEFAULT_MAX_QUEUE_LEN: usize = 1024;
/// Default time an expired, empty window is kept before eviction
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(10 * 60);
/// Default eviction sweep period
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// RateGovernorActor - owns all windows and queues
#[derive(Debug, Default)]
pub struct RateGovernorActor;

/// Arguments for spawning RateGovernorActor
#[derive(Debug, Clone)]
pub struct RateGovernorArguments {
    /// Maximum callers parked per key; further callers get `QueueFull`
    pub max_queue_len: usize,
    /// How long an expired window with no waiters survives before eviction
    pub idle_ttl: Duration,
    /// Eviction sweep period; `None` disables sweeping
    pub sweep_interval: Option<Duration>,
}

impl Default for RateGovernorArguments {
    fn default() -> Self {
        Self {
            max_queue_len: DEFAULT_MAX_QUEUE_LEN,
            idle_ttl: DEFAULT_IDLE_TTL,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

/// A caller waiting for admission
#[derive(Debug)]
pub(crate) struct QueuedAdmission {
    config: RateLimitConfig,
    reply: AdmissionReply,
}

/// Internal state for RateGovernorActor
pub struct RateGovernorState {
    windows: RateWindows<QueuedAdmission>,
    max_queue_len: usize,
    idle_ttl: chrono::Duration,
    sweep_interval: Option<Duration>,
    sweeper: Option<JoinHandle<()>>,
    /// Monotonic counter for drain timers; stale ticks carry an old epoch
    next_epoch: u64,
}

#[async_trait]
impl Actor for RateGovernorActor {
    type Msg = RateGovernorMsg;
    type State = RateGovernorState;
    type Arguments = RateGovernorArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(
            actor_id = %myself.get_id(),
            max_queue_len = args.max_queue_len,
            idle_ttl_ms = args.idle_ttl.as_millis() as u64,
            "RateGovernorActor starting"
        );

        let idle_ttl = chrono::Duration::from_std(args.idle_ttl)
            .map_err(|e| ActorProcessingErr::from(format!("invalid idle_ttl: {e}")))?;

        Ok(RateGovernorState {
            windows: RateWindows::default(),
            max_queue_len: args.max_queue_len.max(1),
            idle_ttl,
            sweep_interval: args.sweep_interval,
            sweeper: None,
            next_epoch: 0,
        })
    }

    async fn post_start(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(interval) = state.sweep_interval {
            state.sweeper = Some(myself.send_interval(interval, || RateGovernorMsg::Sweep));
        }
        info!(actor_id = %myself.get_id(), "RateGovernorActor started successfully");
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RateGovernorMsg::CheckLimit { key, config, reply } => {
                let decision = state.windows.check(&key, &config, Utc::now());
                let _ = reply.send(decision);
            }
            RateGovernorMsg::Acquire { key, config, reply } => {
                self.handle_acquire(&myself, state, key, config, reply);
            }
            RateGovernorMsg::Drain { key, epoch } => {
                self.handle_drain(&myself, state, &key, epoch);
            }
            RateGovernorMsg::Sweep => {
                let evicted = state.windows.evict_idle(state.idle_ttl, Utc::now());
                if !evicted.is_empty() {
                    debug!(
                        evicted = evicted.len(),
                        remaining = state.windows.len(),
                        "Evicted idle rate windows"
                    );
                }
            }
            RateGovernorMsg::ClearLimit { key } => {
                if let Some(window) = state.windows.remove(&key) {
                    reject_waiters(&key, window, || GovernorError::Cleared(key.clone()));
                }
            }
            RateGovernorMsg::ClearAll => {
                for (key, window) in state.windows.drain_all() {
                    reject_waiters(&key, window, || GovernorError::Cleared(key.clone()));
                }
            }
            RateGovernorMsg::GetStatus { key, reply } => {
                let status = state.windows.get_mut(&key).map(|window| {
                    prune_abandoned(&key, window);
                    window.status()
                });
                let _ = reply.send(status);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(sweeper) = state.sweeper.take() {
            sweeper.abort();
        }
        for (key, window) in state.windows.drain_all() {
            reject_waiters(&key, window, || {
                GovernorError::Unavailable("rate governor stopped".to_string())
            });
        }
        info!(actor_id = %myself.get_id(), "RateGovernorActor stopped");
        Ok(())
    }
}

impl RateGovernorActor {
    /// Admit now, or park the caller behind the key's queue.
    ///
    /// While anyone is parked on a key, newcomers queue behind them instead of
    /// competing for a freshly reset window, so grants stay FIFO per key.
    fn handle_acquire(
        &self,
        myself: &ActorRef<RateGovernorMsg>,
        state: &mut RateGovernorState,
        key: String,
        config: RateLimitConfig,
        reply: AdmissionReply,
    ) {
        let now = Utc::now();
        let has_waiters = state
            .windows
            .get_mut(&key)
            .is_some_and(|window| prune_abandoned(&key, window) > 0);

        if !has_waiters {
            let decision = state.windows.check(&key, &config, now);
            if decision.allowed {
                if reply.send(Ok(decision)).is_err() {
                    if let Some(window) = state.windows.get_mut(&key) {
                        window.release_slot();
                    }
                }
                return;
            }
        }

        let Some(window) = state.windows.get_mut(&key) else {
            let _ = reply.send(Err(GovernorError::Unavailable(format!(
                "no rate window for {key}"
            ))));
            return;
        };

        if window.queue.len() >= state.max_queue_len {
            warn!(
                key = %key,
                capacity = state.max_queue_len,
                "Rate limit queue full, rejecting request"
            );
            let _ = reply.send(Err(GovernorError::QueueFull {
                key,
                capacity: state.max_queue_len,
            }));
            return;
        }

        window.queue.push_back(QueuedAdmission { config, reply });
        info!(
            key = %key,
            queue_length = window.queue.len(),
            reset_at = %window.reset_at,
            "Rate limit exceeded, queueing request"
        );

        if window.armed_drain.is_none() {
            arm_drain(myself, &key, window, &mut state.next_epoch);
        }
    }

    /// Grant parked callers in FIFO order until the window denies, then re-arm
    fn handle_drain(
        &self,
        myself: &ActorRef<RateGovernorMsg>,
        state: &mut RateGovernorState,
        key: &str,
        epoch: u64,
    ) {
        let Some(window) = state.windows.get_mut(key) else {
            return;
        };
        if window.armed_drain != Some(epoch) {
            debug!(key = %key, epoch, "Ignoring stale drain tick");
            return;
        }
        window.armed_drain = None;

        let now = Utc::now();
        let mut granted = 0usize;
        while let Some(waiter) = window.queue.pop_front() {
            if waiter.reply.is_closed() {
                debug!(key = %key, "Skipping abandoned rate limit waiter");
                continue;
            }

            let decision = window.admit(&waiter.config, now);
            if !decision.allowed {
                window.queue.push_front(waiter);
                break;
            }

            if waiter.reply.send(Ok(decision)).is_err() {
                window.release_slot();
                continue;
            }
            granted += 1;
        }

        debug!(
            key = %key,
            granted,
            still_queued = window.queue.len(),
            "Drained rate limit queue"
        );

        if !window.queue.is_empty() {
            arm_drain(myself, key, window, &mut state.next_epoch);
        }
    }
}

/// Schedule one drain tick for just after the window resets
fn arm_drain(
    myself: &ActorRef<RateGovernorMsg>,
    key: &str,
    window: &mut RateWindow<QueuedAdmission>,
    next_epoch: &mut u64,
) {
    *next_epoch += 1;
    let epoch = *next_epoch;
    window.armed_drain = Some(epoch);

    let wait = wait_until_expired(window.reset_at, Utc::now());
    let key = key.to_string();
    let _ = myself.send_after(wait, move || RateGovernorMsg::Drain { key, epoch });
}

/// Drop waiters whose callers stopped listening; returns how many remain
fn prune_abandoned(key: &str, window: &mut RateWindow<QueuedAdmission>) -> usize {
    let before = window.queue.len();
    window.queue.retain(|waiter| !waiter.reply.is_closed());
    let pruned = before - window.queue.len();
    if pruned > 0 {
        debug!(key = %key, pruned, "Pruned abandoned rate limit waiters");
    }
    window.queue.len()
}

fn reject_waiters(
    key: &str,
    window: RateWindow<QueuedAdmission>,
    error: impl Fn() -> GovernorError,
) {
    if !window.queue.is_empty() {
        info!(key = %key, rejected = window.queue.len(), "Rejecting parked rate limit waiters");
    }
    for waiter in window.queue {
        let _ = waiter.reply.send(Err(error()));
    }
}
