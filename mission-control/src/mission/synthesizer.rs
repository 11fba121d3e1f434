//! ResultSynthesizer - one governed call that merges everything into a plan

use mission_types::{
    AgentContribution, MissionContext, MissionPhase, MissionResult, ObjectiveAnalysis,
    RateLimitConfig, Sourced,
};
use tokio_util::sync::CancellationToken;

use super::runtime::StageRuntime;
use super::{fallback, MissionError, SYNTHESIZE_KEY};
use crate::gateway::ensure_result;

#[derive(Clone)]
pub struct ResultSynthesizer {
    runtime: StageRuntime,
    limit: RateLimitConfig,
}

impl ResultSynthesizer {
    pub fn new(runtime: StageRuntime, limit: RateLimitConfig) -> Self {
        Self { runtime, limit }
    }

    /// Build the mission result. The returned result always carries exactly
    /// `contributions` as its agent contributions, whatever the service echoed.
    pub async fn synthesize(
        &self,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
        contributions: &[AgentContribution],
        cancel: &CancellationToken,
    ) -> Result<Sourced<MissionResult>, MissionError> {
        let gateway = self.runtime.gateway.clone();
        let outcome = self
            .runtime
            .call_limited(SYNTHESIZE_KEY, self.limit, cancel, || async move {
                let result = gateway
                    .synthesize(objective, context, analysis, contributions)
                    .await?;
                ensure_result(&result)?;
                Ok(result)
            })
            .await;

        match outcome {
            Ok(mut result) => {
                if result.agent_contributions.len() != contributions.len() {
                    tracing::debug!(
                        echoed = result.agent_contributions.len(),
                        dispatched = contributions.len(),
                        "Synthesis echoed a different contribution list"
                    );
                }
                result.agent_contributions = contributions.to_vec();
                Ok(Sourced::live(result))
            }
            Err(e) if e.is_cancelled() => Err(MissionError::Cancelled(MissionPhase::Synthesizing)),
            Err(e) => {
                tracing::warn!(error = %e, "Synthesis failed, using fallback plan");
                Ok(Sourced::fallback(
                    fallback::mission_result(objective, contributions),
                    e.to_string(),
                ))
            }
        }
    }
}
