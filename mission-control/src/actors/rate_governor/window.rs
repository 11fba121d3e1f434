//! Fixed-window counters owned by the RateGovernorActor
//!
//! Pure state: every method takes `now` explicitly so the actor decides the
//! clock and tests can drive time by hand.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use mission_types::{RateLimitConfig, RateLimitDecision, RateWindowStatus};

/// One key's window plus the waiters parked behind it
#[derive(Debug)]
pub(crate) struct RateWindow<W> {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
    pub queue: VecDeque<W>,
    /// Epoch of the drain timer currently armed for this window, if any
    pub armed_drain: Option<u64>,
}

impl<W> RateWindow<W> {
    fn open(config: &RateLimitConfig, now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            reset_at: now + window_length(config),
            queue: VecDeque::new(),
            armed_drain: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }

    /// Count one request against this window, resetting it in place first if it expired
    pub fn admit(&mut self, config: &RateLimitConfig, now: DateTime<Utc>) -> RateLimitDecision {
        if self.is_expired(now) {
            self.count = 1;
            self.reset_at = now + window_length(config);
            return allowed(config.max_requests.saturating_sub(1), self.reset_at);
        }

        if self.count < config.max_requests {
            self.count += 1;
            return allowed(config.max_requests - self.count, self.reset_at);
        }

        RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: self.reset_at,
            retry_after: Some(retry_after_secs(self.reset_at, now)),
        }
    }

    /// Give back a slot that was counted but never used
    pub fn release_slot(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn status(&self) -> RateWindowStatus {
        RateWindowStatus {
            count: self.count,
            reset_at: self.reset_at,
            queue_length: self.queue.len(),
        }
    }
}

/// All windows, keyed by rate-limit key
#[derive(Debug)]
pub(crate) struct RateWindows<W> {
    windows: HashMap<String, RateWindow<W>>,
}

impl<W> Default for RateWindows<W> {
    fn default() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }
}

impl<W> RateWindows<W> {
    /// Count one request against `key`.
    ///
    /// A missing or expired window is (re)opened with count 1 and the request
    /// is allowed. Otherwise the request is allowed while `count < max_requests`.
    /// Expired windows are reset in place so parked waiters survive the reset.
    pub fn check(
        &mut self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let Some(window) = self.windows.get_mut(key) else {
            let window = RateWindow::open(config, now);
            let reset_at = window.reset_at;
            self.windows.insert(key.to_string(), window);
            return allowed(config.max_requests.saturating_sub(1), reset_at);
        };
        window.admit(config, now)
    }

    pub fn get(&self, key: &str) -> Option<&RateWindow<W>> {
        self.windows.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RateWindow<W>> {
        self.windows.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<RateWindow<W>> {
        self.windows.remove(key)
    }

    pub fn drain_all(&mut self) -> Vec<(String, RateWindow<W>)> {
        self.windows.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows that expired more than `idle_ttl` ago and have nobody waiting.
    /// Returns the evicted keys.
    pub fn evict_idle(&mut self, idle_ttl: Duration, now: DateTime<Utc>) -> Vec<String> {
        let stale: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, window)| window.queue.is_empty() && now > window.reset_at + idle_ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.windows.remove(key);
        }
        stale
    }
}

fn allowed(remaining: u32, reset_at: DateTime<Utc>) -> RateLimitDecision {
    RateLimitDecision {
        allowed: true,
        remaining,
        reset_at,
        retry_after: None,
    }
}

fn window_length(config: &RateLimitConfig) -> Duration {
    Duration::milliseconds(i64::try_from(config.window_ms).unwrap_or(i64::MAX))
}

/// Seconds until `reset_at`, rounded up
fn retry_after_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let remaining_ms = (reset_at - now).num_milliseconds().max(0) as u64;
    remaining_ms.div_ceil(1000)
}

/// How long to sleep so that a check made after waking sees an expired window
pub(crate) fn wait_until_expired(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    let until_reset = (reset_at - now).to_std().unwrap_or_default();
    until_reset + std::time::Duration::from_millis(1)
}
