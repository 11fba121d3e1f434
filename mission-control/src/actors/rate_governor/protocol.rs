//! RateGovernorActor message protocol
//!
//! Defines the messages the RateGovernorActor handles and the errors callers
//! of the governor can observe.

use mission_types::{RateLimitConfig, RateLimitDecision, RateWindowStatus};
use ractor::RpcReplyPort;

/// Reply sent to a caller waiting for admission
pub type AdmissionReply = RpcReplyPort<Result<RateLimitDecision, GovernorError>>;

/// Messages handled by RateGovernorActor
#[derive(Debug)]
pub enum RateGovernorMsg {
    /// Count one request against a key and report the decision
    CheckLimit {
        key: String,
        config: RateLimitConfig,
        reply: RpcReplyPort<RateLimitDecision>,
    },
    /// Ask for admission; answered immediately or once a queued slot frees up
    Acquire {
        key: String,
        config: RateLimitConfig,
        reply: AdmissionReply,
    },
    /// Timer tick: grant as many queued waiters as the window allows
    Drain { key: String, epoch: u64 },
    /// Timer tick: evict idle windows
    Sweep,
    /// Forget a key, rejecting anyone parked on it
    ClearLimit { key: String },
    /// Forget every key
    ClearAll,
    /// Inspect a key's window
    GetStatus {
        key: String,
        reply: RpcReplyPort<Option<RateWindowStatus>>,
    },
}

/// Errors surfaced by the rate governor
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GovernorError {
    /// The governor actor could not be reached
    #[error("rate governor unavailable: {0}")]
    Unavailable(String),
    /// Too many callers already waiting on this key
    #[error("rate limit queue full for {key} ({capacity} waiting)")]
    QueueFull { key: String, capacity: usize },
    /// The key was cleared while the caller was waiting
    #[error("rate limit for {0} was cleared while waiting")]
    Cleared(String),
    /// The caller gave up while waiting
    #[error("cancelled while waiting on rate limit for {0}")]
    Cancelled(String),
}
