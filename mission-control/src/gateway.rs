//! Inference gateway - the three AI-service endpoints the mission stages call
//!
//! Stages depend on the `InferenceGateway` trait so tests can swap in
//! hand-written gateways; production uses `HttpInferenceGateway`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mission_types::{AgentContribution, MissionContext, MissionResult, ObjectiveAnalysis};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::actors::GovernorError;

pub type SharedInferenceGateway = Arc<dyn InferenceGateway>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("call timed out after {0}ms")]
    Timeout(u64),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("call cancelled")]
    Cancelled,
    #[error(transparent)]
    Governor(#[from] GovernorError),
}

impl GatewayError {
    /// True when the failure came from the caller giving up, not from the service
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Governor(GovernorError::Cancelled(_))
        )
    }
}

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn analyze(
        &self,
        objective: &str,
        context: &MissionContext,
    ) -> Result<ObjectiveAnalysis, GatewayError>;

    async fn contribute(
        &self,
        agent_id: &str,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
    ) -> Result<AgentContribution, GatewayError>;

    async fn synthesize(
        &self,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
        contributions: &[AgentContribution],
    ) -> Result<MissionResult, GatewayError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    objective: &'a str,
    context: &'a MissionContext,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContributeRequest<'a> {
    objective: &'a str,
    context: &'a MissionContext,
    analysis: &'a ObjectiveAnalysis,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    objective: &'a str,
    context: &'a MissionContext,
    analysis: &'a ObjectiveAnalysis,
    contributions: &'a [AgentContribution],
}

/// JSON-over-HTTP gateway to the AI service
#[derive(Debug, Clone)]
pub struct HttpInferenceGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpInferenceGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("mission-control/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(format!("{url}: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(format!("{url}: {e}")))
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn analyze(
        &self,
        objective: &str,
        context: &MissionContext,
    ) -> Result<ObjectiveAnalysis, GatewayError> {
        self.post_json(
            "/api/mission-control/analyze",
            &AnalyzeRequest { objective, context },
        )
        .await
    }

    async fn contribute(
        &self,
        agent_id: &str,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
    ) -> Result<AgentContribution, GatewayError> {
        self.post_json(
            &format!("/api/agents/{agent_id}/contribute"),
            &ContributeRequest {
                objective,
                context,
                analysis,
            },
        )
        .await
    }

    async fn synthesize(
        &self,
        objective: &str,
        context: &MissionContext,
        analysis: &ObjectiveAnalysis,
        contributions: &[AgentContribution],
    ) -> Result<MissionResult, GatewayError> {
        self.post_json(
            "/api/mission-control/synthesize",
            &SynthesizeRequest {
                objective,
                context,
                analysis,
                contributions,
            },
        )
        .await
    }
}

// Payload checks shared by the stages. A payload that decodes but fails
// these is treated like any other failed call.

/// Reject analyses the service returned but left blank
pub fn ensure_analysis(analysis: &ObjectiveAnalysis) -> Result<(), GatewayError> {
    if analysis.category.trim().is_empty() {
        return Err(GatewayError::InvalidPayload("analysis has no category".to_string()));
    }
    if analysis.complexity.trim().is_empty() {
        return Err(GatewayError::InvalidPayload(
            "analysis has no complexity".to_string(),
        ));
    }
    Ok(())
}

/// A contribution must belong to the agent that was asked
pub fn ensure_contribution(
    agent_id: &str,
    contribution: &AgentContribution,
) -> Result<(), GatewayError> {
    if contribution.agent_id != agent_id {
        return Err(GatewayError::InvalidPayload(format!(
            "contribution for {agent_id} came back as {}",
            contribution.agent_id
        )));
    }
    if contribution.analysis.trim().is_empty() {
        return Err(GatewayError::InvalidPayload(format!(
            "contribution from {agent_id} has no analysis"
        )));
    }
    Ok(())
}

pub fn ensure_result(result: &MissionResult) -> Result<(), GatewayError> {
    if result.executive_summary.trim().is_empty() {
        return Err(GatewayError::InvalidPayload(
            "mission result has no executive summary".to_string(),
        ));
    }
    if result.detailed_plan.phases.is_empty() {
        return Err(GatewayError::InvalidPayload(
            "mission result has no plan phases".to_string(),
        ));
    }
    Ok(())
}
