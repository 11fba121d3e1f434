//! AgentDispatcher - concurrent fan-out, one contribution per agent
//!
//! Every agent call runs concurrently and independently. A failure in one
//! branch is replaced by that agent's fallback contribution without touching
//! its siblings, and the stage waits for every branch before returning.

use futures::stream::{FuturesUnordered, StreamExt};
use mission_types::{
    AgentContribution, MissionContext, MissionPhase, ObjectiveAnalysis, RateLimitConfig, Sourced,
};
use tokio_util::sync::CancellationToken;

use super::runtime::StageRuntime;
use super::{fallback, MissionError, CONTRIBUTE_KEY};
use crate::config::DispatchKeyMode;
use crate::gateway::{ensure_contribution, GatewayError};

#[derive(Clone)]
pub struct AgentDispatcher {
    runtime: StageRuntime,
    limit: RateLimitConfig,
    key_mode: DispatchKeyMode,
}

impl AgentDispatcher {
    pub fn new(runtime: StageRuntime, limit: RateLimitConfig, key_mode: DispatchKeyMode) -> Self {
        Self {
            runtime,
            limit,
            key_mode,
        }
    }

    /// Rate-limit key for one agent's calls
    pub fn rate_key(&self, agent_id: &str) -> String {
        match self.key_mode {
            DispatchKeyMode::Shared => CONTRIBUTE_KEY.to_string(),
            DispatchKeyMode::PerAgent => format!("{CONTRIBUTE_KEY}:{agent_id}"),
        }
    }

    /// Ask every agent in `agent_ids` for a contribution.
    ///
    /// Returns exactly one entry per requested agent, in dispatch order. Branches
    /// finish in any order; results are slotted back by the agent they belong to.
    pub async fn dispatch(
        &self,
        agent_ids: &[String],
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
        cancel: &CancellationToken,
    ) -> Result<Vec<Sourced<AgentContribution>>, MissionError> {
        tracing::info!(agents = agent_ids.len(), "Dispatching objective to agents");

        let mut branches: FuturesUnordered<_> = agent_ids
            .iter()
            .enumerate()
            .map(|(slot, agent_id)| async move {
                let outcome = self
                    .contribute(agent_id, objective, context, analysis, cancel)
                    .await;
                (slot, outcome)
            })
            .collect();

        let mut slots: Vec<Option<Sourced<AgentContribution>>> = vec![None; agent_ids.len()];
        let mut cancelled = false;
        while let Some((slot, outcome)) = branches.next().await {
            let agent_id = &agent_ids[slot];
            match outcome {
                Ok(contribution) => {
                    tracing::debug!(agent_id = %agent_id, "Agent contribution received");
                    slots[slot] = Some(Sourced::live(contribution));
                }
                Err(e) if e.is_cancelled() => cancelled = true,
                Err(e) => {
                    tracing::warn!(
                        agent_id = %agent_id,
                        error = %e,
                        "Agent contribution failed, using fallback"
                    );
                    slots[slot] = Some(Sourced::fallback(
                        fallback::contribution(agent_id),
                        e.to_string(),
                    ));
                }
            }
        }

        if cancelled {
            return Err(MissionError::Cancelled(MissionPhase::Dispatching));
        }

        Ok(slots
            .into_iter()
            .zip(agent_ids)
            .map(|(slot, agent_id)| {
                slot.unwrap_or_else(|| {
                    Sourced::fallback(fallback::contribution(agent_id), "no contribution recorded")
                })
            })
            .collect())
    }

    async fn contribute(
        &self,
        agent_id: &str,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
        cancel: &CancellationToken,
    ) -> Result<AgentContribution, GatewayError> {
        let gateway = self.runtime.gateway.clone();
        let key = self.rate_key(agent_id);
        self.runtime
            .call_limited(&key, self.limit, cancel, || async move {
                let contribution = gateway
                    .contribute(agent_id, objective, context, analysis)
                    .await?;
                ensure_contribution(agent_id, &contribution)?;
                Ok(contribution)
            })
            .await
    }
}
