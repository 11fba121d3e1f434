//! MissionOrchestrator - sequences the three stages for one session

use std::collections::{BTreeMap, HashSet};

use mission_types::{
    AgentContribution, MissionOutcome, MissionPhase, MissionProvenance, MissionResult,
    MissionSession, ObjectiveAnalysis, PhaseTransition, Provenance, Sourced,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::runtime::StageRuntime;
use super::{AgentDispatcher, MissionError, MissionState, ObjectiveAnalyzer, ResultSynthesizer};
use crate::config::MissionConfig;

/// Receives every phase a run enters, as it enters it
pub type ProgressSender = mpsc::UnboundedSender<PhaseTransition>;

#[derive(Clone)]
pub struct MissionOrchestrator {
    analyzer: ObjectiveAnalyzer,
    dispatcher: AgentDispatcher,
    synthesizer: ResultSynthesizer,
    default_agents: Vec<String>,
}

struct StageOutputs {
    analysis: Sourced<ObjectiveAnalysis>,
    contributions: Vec<Sourced<AgentContribution>>,
    synthesis: Sourced<MissionResult>,
}

impl MissionOrchestrator {
    pub fn new(runtime: StageRuntime, config: &MissionConfig) -> Self {
        Self {
            analyzer: ObjectiveAnalyzer::new(runtime.clone(), config.limits.analyze.rate_limit()),
            dispatcher: AgentDispatcher::new(
                runtime.clone(),
                config.limits.contribute.rate_limit(),
                config.dispatch.key_mode,
            ),
            synthesizer: ResultSynthesizer::new(runtime, config.limits.synthesize.rate_limit()),
            default_agents: unique_in_order(&config.dispatch.default_agents),
        }
    }

    /// Agents a session will be dispatched to: its own list, or the default roster
    pub fn resolve_agents(&self, session: &MissionSession) -> Vec<String> {
        if session.agents_involved.is_empty() {
            self.default_agents.clone()
        } else {
            session.agents_involved.clone()
        }
    }

    /// Run a session to completion and return only the plan
    pub async fn orchestrate(&self, session: &MissionSession) -> Result<MissionResult, MissionError> {
        let cancel = CancellationToken::new();
        self.orchestrate_with(session, &cancel, None)
            .await
            .map(|outcome| outcome.result)
    }

    /// Run a session with cancellation and optional progress reporting.
    ///
    /// Network failures never fail the run; they show up as fallback
    /// provenance in the outcome. Errors are limited to invalid sessions and
    /// cancellation.
    pub async fn orchestrate_with(
        &self,
        session: &MissionSession,
        cancel: &CancellationToken,
        progress: Option<ProgressSender>,
    ) -> Result<MissionOutcome, MissionError> {
        validate_session(session)?;
        let agents = self.resolve_agents(session);

        tracing::info!(
            session_id = %session.id,
            user_id = %session.owner.id,
            agents = ?agents,
            "Mission orchestration started"
        );

        let mut run = RunTracker::new(&session.id, progress);
        let outputs = match self.run_stages(session, &agents, cancel, &mut run).await {
            Ok(outputs) => outputs,
            Err(MissionError::Cancelled(phase)) => {
                run.enter(MissionPhase::Cancelled)?;
                tracing::info!(session_id = %session.id, phase = phase.as_str(), "Mission cancelled");
                return Err(MissionError::Cancelled(phase));
            }
            Err(e) => return Err(e),
        };
        run.enter(MissionPhase::Completed)?;

        let provenance = MissionProvenance {
            analysis: outputs.analysis.provenance,
            contributions: agents
                .iter()
                .cloned()
                .zip(outputs.contributions.iter().map(|c| c.provenance.clone()))
                .collect::<BTreeMap<String, Provenance>>(),
            synthesis: outputs.synthesis.provenance,
        };

        tracing::info!(
            session_id = %session.id,
            fully_live = provenance.is_fully_live(),
            contributions = outputs.synthesis.value.agent_contributions.len(),
            "Mission orchestration completed"
        );

        Ok(MissionOutcome {
            session_id: session.id.clone(),
            result: outputs.synthesis.value,
            provenance,
            transitions: run.state.into_transitions(),
        })
    }

    async fn run_stages(
        &self,
        session: &MissionSession,
        agents: &[String],
        cancel: &CancellationToken,
        run: &mut RunTracker<'_>,
    ) -> Result<StageOutputs, MissionError> {
        run.enter(MissionPhase::Analyzing)?;
        check_cancelled(cancel, MissionPhase::Analyzing)?;
        let analysis = self
            .analyzer
            .analyze(&session.objective, &session.context, cancel)
            .await?;

        run.enter(MissionPhase::Dispatching)?;
        check_cancelled(cancel, MissionPhase::Dispatching)?;
        let contributions = self
            .dispatcher
            .dispatch(
                agents,
                &session.objective,
                &session.context,
                &analysis.value,
                cancel,
            )
            .await?;

        run.enter(MissionPhase::Synthesizing)?;
        check_cancelled(cancel, MissionPhase::Synthesizing)?;
        let dispatched: Vec<AgentContribution> =
            contributions.iter().map(|c| c.value.clone()).collect();
        let synthesis = self
            .synthesizer
            .synthesize(
                &session.objective,
                &session.context,
                &analysis.value,
                &dispatched,
                cancel,
            )
            .await?;

        Ok(StageOutputs {
            analysis,
            contributions,
            synthesis,
        })
    }
}

/// Reject sessions no stage could meaningfully run
pub fn validate_session(session: &MissionSession) -> Result<(), MissionError> {
    if session.id.trim().is_empty() {
        return Err(MissionError::InvalidSession("session id is empty".to_string()));
    }
    if session.objective.trim().is_empty() {
        return Err(MissionError::InvalidSession("objective is empty".to_string()));
    }

    check_agent_ids(&session.agents_involved).map_err(MissionError::InvalidSession)
}

/// Agent ids end up in URL paths and rate keys, so keep them to `[A-Za-z0-9_-]`
pub fn is_valid_agent_id(agent_id: &str) -> bool {
    !agent_id.is_empty()
        && agent_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Every id must be well formed and appear once
pub fn check_agent_ids(agent_ids: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for agent_id in agent_ids {
        if agent_id.trim().is_empty() {
            return Err("agent id is empty".to_string());
        }
        if !is_valid_agent_id(agent_id) {
            return Err(format!(
                "agent id {agent_id:?} may only contain letters, digits, '-' and '_'"
            ));
        }
        if !seen.insert(agent_id.as_str()) {
            return Err(format!("agent {agent_id} is listed more than once"));
        }
    }
    Ok(())
}

fn unique_in_order(agent_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    agent_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn check_cancelled(cancel: &CancellationToken, phase: MissionPhase) -> Result<(), MissionError> {
    if cancel.is_cancelled() {
        return Err(MissionError::Cancelled(phase));
    }
    Ok(())
}

struct RunTracker<'a> {
    session_id: &'a str,
    state: MissionState,
    progress: Option<ProgressSender>,
}

impl<'a> RunTracker<'a> {
    fn new(session_id: &'a str, progress: Option<ProgressSender>) -> Self {
        let state = MissionState::new();
        if let (Some(tx), Some(received)) = (progress.as_ref(), state.transitions().first()) {
            let _ = tx.send(received.clone());
        }
        Self {
            session_id,
            state,
            progress,
        }
    }

    fn enter(&mut self, phase: MissionPhase) -> Result<(), MissionError> {
        let transition = self.state.advance(phase)?;
        tracing::debug!(
            session_id = %self.session_id,
            phase = phase.as_str(),
            "Mission phase entered"
        );
        if let Some(tx) = self.progress.as_ref() {
            // A dropped receiver only means nobody is watching
            let _ = tx.send(transition);
        }
        Ok(())
    }
}
