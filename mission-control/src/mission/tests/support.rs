use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mission_types::{
    AgentContribution, MissionContext, MissionOwner, MissionResult, MissionSession,
    ObjectiveAnalysis,
};

use crate::actors::{RateGovernor, RateGovernorArguments};
use crate::gateway::{GatewayError, InferenceGateway};
use crate::mission::{fallback, StageRuntime};

/// Gateway whose behaviour per endpoint and per agent is set by the test
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    pub fail_analyze: bool,
    pub hang_analyze: bool,
    pub fail_synthesize: bool,
    /// Synthesis answers with an empty contribution list
    pub synthesize_drops_contributions: bool,
    pub failing_agents: HashSet<String>,
    pub hanging_agents: HashSet<String>,
    /// Agents that answer under somebody else's id
    pub impostor_agents: HashSet<String>,
    pub agent_delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn all_failing() -> Self {
        Self {
            fail_analyze: true,
            fail_synthesize: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) fn live_analysis() -> ObjectiveAnalysis {
    ObjectiveAnalysis {
        category: "growth".to_string(),
        complexity: "high".to_string(),
        required_expertise: vec!["marketing".to_string(), "sales".to_string()],
        estimated_duration: "6-8 weeks".to_string(),
    }
}

pub(crate) fn live_contribution(agent_id: &str) -> AgentContribution {
    AgentContribution {
        agent_id: agent_id.to_string(),
        agent_name: format!("Agent {agent_id}"),
        analysis: format!("{agent_id} sees a clear opening"),
        recommendations: vec![format!("{agent_id}: focus on retention")],
        resources: Some(vec![format!("https://example.com/{agent_id}")]),
    }
}

pub(crate) fn live_result(contributions: &[AgentContribution]) -> MissionResult {
    let mut result = fallback::mission_result("ignored", contributions);
    result.executive_summary = "Live synthesized plan".to_string();
    result.detailed_plan.phases.truncate(2);
    result
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn analyze(
        &self,
        _objective: &str,
        _context: &MissionContext,
    ) -> Result<ObjectiveAnalysis, GatewayError> {
        self.record("analyze".to_string());
        if self.hang_analyze {
            std::future::pending::<()>().await;
        }
        if self.fail_analyze {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        Ok(live_analysis())
    }

    async fn contribute(
        &self,
        agent_id: &str,
        _objective: &str,
        _context: &MissionContext,
        _analysis: &ObjectiveAnalysis,
    ) -> Result<AgentContribution, GatewayError> {
        self.record(format!("contribute:{agent_id}"));
        if let Some(delay) = self.agent_delays.get(agent_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.hanging_agents.contains(agent_id) {
            std::future::pending::<()>().await;
        }
        if self.failing_agents.contains(agent_id) {
            return Err(GatewayError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        if self.impostor_agents.contains(agent_id) {
            return Ok(live_contribution("someone-else"));
        }
        Ok(live_contribution(agent_id))
    }

    async fn synthesize(
        &self,
        _objective: &str,
        _context: &MissionContext,
        _analysis: &ObjectiveAnalysis,
        contributions: &[AgentContribution],
    ) -> Result<MissionResult, GatewayError> {
        self.record("synthesize".to_string());
        if self.fail_synthesize {
            return Err(GatewayError::Decode("expected value at line 1".to_string()));
        }
        if self.synthesize_drops_contributions {
            return Ok(live_result(&[]));
        }
        Ok(live_result(contributions))
    }
}

pub(crate) async fn spawn_governor() -> RateGovernor {
    let (governor, _handle) = RateGovernor::spawn(RateGovernorArguments {
        sweep_interval: None,
        ..RateGovernorArguments::default()
    })
    .await
    .unwrap();
    governor
}

pub(crate) async fn runtime_with(
    gateway: Arc<ScriptedGateway>,
    call_timeout: Duration,
) -> StageRuntime {
    StageRuntime::new(spawn_governor().await, gateway, call_timeout)
}

pub(crate) fn session(agents: &[&str]) -> MissionSession {
    MissionSession {
        id: "session-1".to_string(),
        objective: "Grow monthly recurring revenue by 20%".to_string(),
        agents_involved: agents.iter().map(|id| (*id).to_string()).collect(),
        context: MissionContext::new(),
        owner: MissionOwner {
            id: "user-1".to_string(),
            email: None,
        },
    }
}

pub(crate) fn agent_ids(agents: &[&str]) -> Vec<String> {
    agents.iter().map(|id| (*id).to_string()).collect()
}
