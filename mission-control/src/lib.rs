//! Mission Control - rate-governed mission orchestration
//!
//! Takes a business objective, classifies it, fans it out to a set of agent
//! identities on the AI service, and synthesizes their contributions into one
//! structured plan. Every outbound call goes through a single RateGovernor
//! actor that queues excess calls instead of rejecting them.

pub mod actors;
pub mod api;
pub mod app_state;
pub mod config;
pub mod gateway;
pub mod mission;
