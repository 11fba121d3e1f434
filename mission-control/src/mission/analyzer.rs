//! ObjectiveAnalyzer - one governed call to classify the objective

use mission_types::{MissionContext, MissionPhase, ObjectiveAnalysis, RateLimitConfig, Sourced};
use tokio_util::sync::CancellationToken;

use super::runtime::StageRuntime;
use super::{fallback, MissionError, ANALYZE_KEY};
use crate::gateway::ensure_analysis;

#[derive(Clone)]
pub struct ObjectiveAnalyzer {
    runtime: StageRuntime,
    limit: RateLimitConfig,
}

impl ObjectiveAnalyzer {
    pub fn new(runtime: StageRuntime, limit: RateLimitConfig) -> Self {
        Self { runtime, limit }
    }

    /// Classify `objective`. Any failure yields the fixed fallback analysis;
    /// only cancellation is an error.
    pub async fn analyze(
        &self,
        objective: &str,
        context: &MissionContext,
        cancel: &CancellationToken,
    ) -> Result<Sourced<ObjectiveAnalysis>, MissionError> {
        let gateway = self.runtime.gateway.clone();
        let outcome = self
            .runtime
            .call_limited(ANALYZE_KEY, self.limit, cancel, || async move {
                let analysis = gateway.analyze(objective, context).await?;
                ensure_analysis(&analysis)?;
                Ok(analysis)
            })
            .await;

        match outcome {
            Ok(analysis) => {
                tracing::debug!(
                    category = %analysis.category,
                    complexity = %analysis.complexity,
                    "Objective analyzed"
                );
                Ok(Sourced::live(analysis))
            }
            Err(e) if e.is_cancelled() => Err(MissionError::Cancelled(MissionPhase::Analyzing)),
            Err(e) => {
                tracing::warn!(error = %e, "Objective analysis failed, using fallback");
                Ok(Sourced::fallback(fallback::analysis(), e.to_string()))
            }
        }
    }
}
