use std::sync::Arc;

use crate::actors::RateGovernor;
use crate::config::MissionConfig;
use crate::gateway::SharedInferenceGateway;
use crate::mission::{MissionOrchestrator, StageRuntime};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MissionConfig,
    governor: RateGovernor,
    orchestrator: MissionOrchestrator,
}

impl AppState {
    pub fn new(
        config: MissionConfig,
        governor: RateGovernor,
        gateway: SharedInferenceGateway,
    ) -> Self {
        let runtime = StageRuntime::new(governor.clone(), gateway, config.service.call_timeout());
        let orchestrator = MissionOrchestrator::new(runtime, &config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                governor,
                orchestrator,
            }),
        }
    }

    pub fn config(&self) -> &MissionConfig {
        &self.inner.config
    }

    pub fn governor(&self) -> &RateGovernor {
        &self.inner.governor
    }

    pub fn orchestrator(&self) -> &MissionOrchestrator {
        &self.inner.orchestrator
    }
}
