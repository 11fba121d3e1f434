//! Shared types between the mission-control service and the dashboard
//!
//! These types are used by both:
//! - The orchestration backend (native Rust)
//! - The dashboard frontend (TypeScript bindings generated by ts-rs)
//!
//! Serialized with serde in the camelCase JSON shape the AI service speaks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Free-form business facts attached to a mission (businessType, timeline, constraints, ...)
pub type MissionContext = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Sessions
// ============================================================================

/// The user a mission session belongs to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct MissionOwner {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One orchestration request. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct MissionSession {
    pub id: String,
    pub objective: String,
    /// Selected agent identities. Empty means auto-select.
    #[serde(default)]
    pub agents_involved: Vec<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub context: MissionContext,
    pub owner: MissionOwner,
}

// ============================================================================
// Stage outputs
// ============================================================================

/// Classification of an objective, produced once per session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct ObjectiveAnalysis {
    pub category: String,
    pub complexity: String,
    pub required_expertise: Vec<String>,
    pub estimated_duration: String,
}

/// One agent's analysis and recommendations for an objective
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct AgentContribution {
    pub agent_id: String,
    pub agent_name: String,
    pub analysis: String,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct PlanPhase {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct DetailedPlan {
    pub overview: String,
    pub phases: Vec<PlanPhase>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "mission.ts")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct ActionItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: ActionPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct RiskEntry {
    pub risk: String,
    pub impact: String,
    pub mitigation: String,
}

/// The synthesized plan returned to the caller. Always fully populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct MissionResult {
    pub executive_summary: String,
    pub detailed_plan: DetailedPlan,
    pub action_items: Vec<ActionItem>,
    pub resources: Vec<ResourceRef>,
    pub agent_contributions: Vec<AgentContribution>,
    pub risks: Vec<RiskEntry>,
    pub success_metrics: Vec<String>,
}

// ============================================================================
// Provenance
// ============================================================================

/// Whether a stage output came from the live service or a local fallback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "source", rename_all = "snake_case")]
#[ts(export, export_to = "mission.ts")]
pub enum Provenance {
    Live,
    Fallback { reason: String },
}

impl Provenance {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::Fallback {
            reason: reason.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A stage output tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Live,
        }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            provenance: Provenance::fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance.is_fallback()
    }
}

// ============================================================================
// Orchestration lifecycle
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "mission.ts")]
pub enum MissionPhase {
    Received,
    Analyzing,
    Dispatching,
    Synthesizing,
    Completed,
    Cancelled,
}

impl MissionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Analyzing => "analyzing",
            Self::Dispatching => "dispatching",
            Self::Synthesizing => "synthesizing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct PhaseTransition {
    pub phase: MissionPhase,
    pub at: DateTime<Utc>,
}

/// Per-stage provenance for one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct MissionProvenance {
    pub analysis: Provenance,
    /// Agent id -> provenance of that agent's contribution
    pub contributions: BTreeMap<String, Provenance>,
    pub synthesis: Provenance,
}

impl MissionProvenance {
    /// True when no stage had to fall back
    pub fn is_fully_live(&self) -> bool {
        !self.analysis.is_fallback()
            && !self.synthesis.is_fallback()
            && self.contributions.values().all(|p| !p.is_fallback())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct MissionOutcome {
    pub session_id: String,
    pub result: MissionResult,
    pub provenance: MissionProvenance,
    pub transitions: Vec<PhaseTransition>,
}

// ============================================================================
// Rate limiting
// ============================================================================

pub const HEADER_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }
}

/// Result of one fixed-window admission check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Whole seconds until the window resets, rounded up. Only set when denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "mission.ts")]
pub struct RateWindowStatus {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
    pub queue_length: usize,
}

/// Rate-limit headers for HTTP-facing callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    pub fn from_decision(config: &RateLimitConfig, decision: &RateLimitDecision) -> Self {
        Self {
            limit: config.max_requests,
            remaining: decision.remaining,
            reset: decision.reset_at,
            retry_after: decision.retry_after,
        }
    }

    /// Header name/value pairs; `Retry-After` only appears when the request was denied
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (HEADER_RATE_LIMIT_LIMIT, self.limit.to_string()),
            (HEADER_RATE_LIMIT_REMAINING, self.remaining.to_string()),
            (
                HEADER_RATE_LIMIT_RESET,
                self.reset
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
        ];
        if let Some(retry_after) = self.retry_after {
            pairs.push((HEADER_RETRY_AFTER, retry_after.to_string()));
        }
        pairs
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    #[test]
    fn test_mission_result_wire_shape_is_camel_case() {
        let result = MissionResult {
            executive_summary: "summary".to_string(),
            detailed_plan: DetailedPlan {
                overview: "overview".to_string(),
                phases: vec![],
            },
            action_items: vec![ActionItem {
                id: "1".to_string(),
                title: "Define KPIs".to_string(),
                description: "Measurable".to_string(),
                priority: ActionPriority::High,
                assigned_to: None,
                estimated_time: Some("2 hours".to_string()),
            }],
            resources: vec![ResourceRef {
                kind: "tool".to_string(),
                title: "Tracker".to_string(),
                description: "Tracks things".to_string(),
                url: None,
            }],
            agent_contributions: vec![],
            risks: vec![],
            success_metrics: vec!["ROI".to_string()],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["executiveSummary"], "summary");
        assert_eq!(json["actionItems"][0]["priority"], "high");
        assert_eq!(json["actionItems"][0]["estimatedTime"], "2 hours");
        assert!(json["actionItems"][0].get("assignedTo").is_none());
        assert_eq!(json["resources"][0]["type"], "tool");
        assert!(json["detailedPlan"]["phases"].is_array());
    }

    #[test]
    fn test_contribution_accepts_missing_resources() {
        let raw = r#"{
            "agentId": "roxy",
            "agentName": "Roxy",
            "analysis": "Streamline onboarding",
            "recommendations": ["Automate intake"]
        }"#;
        let contribution: AgentContribution = serde_json::from_str(raw).unwrap();
        assert_eq!(contribution.agent_id, "roxy");
        assert!(contribution.resources.is_none());
    }

    #[test]
    fn test_session_defaults_agents_and_context() {
        let raw = r#"{
            "id": "s1",
            "objective": "Launch the spring product line",
            "owner": { "id": "u1" }
        }"#;
        let session: MissionSession = serde_json::from_str(raw).unwrap();
        assert!(session.agents_involved.is_empty());
        assert!(session.context.is_empty());
        assert_eq!(session.owner.email, None);
    }

    #[test]
    fn test_provenance_tagging() {
        let live = serde_json::to_value(Provenance::Live).unwrap();
        assert_eq!(live, serde_json::json!({"source": "live"}));

        let fallback = serde_json::to_value(Provenance::fallback("timeout")).unwrap();
        assert_eq!(
            fallback,
            serde_json::json!({"source": "fallback", "reason": "timeout"})
        );

        let sourced = Sourced::fallback(3, "boom");
        assert!(sourced.is_fallback());
        assert!(!Sourced::live(3).is_fallback());
    }

    #[test]
    fn test_mission_provenance_fully_live() {
        let mut provenance = MissionProvenance {
            analysis: Provenance::Live,
            contributions: BTreeMap::from([("roxy".to_string(), Provenance::Live)]),
            synthesis: Provenance::Live,
        };
        assert!(provenance.is_fully_live());

        provenance
            .contributions
            .insert("echo".to_string(), Provenance::fallback("status 502"));
        assert!(!provenance.is_fully_live());
    }

    #[test]
    fn test_rate_limit_headers_include_retry_after_only_when_denied() {
        let config = RateLimitConfig::new(3, 1000);
        let reset_at = DateTime::parse_from_rfc3339("2026-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);

        let allowed = RateLimitDecision {
            allowed: true,
            remaining: 2,
            reset_at,
            retry_after: None,
        };
        let pairs = RateLimitHeaders::from_decision(&config, &allowed).to_pairs();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&(HEADER_RATE_LIMIT_LIMIT, "3".to_string())));
        assert!(pairs.contains(&(HEADER_RATE_LIMIT_REMAINING, "2".to_string())));
        assert!(pairs.contains(&(
            HEADER_RATE_LIMIT_RESET,
            "2026-01-01T00:00:01.000Z".to_string()
        )));

        let denied = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at,
            retry_after: Some(1),
        };
        let pairs = RateLimitHeaders::from_decision(&config, &denied).to_pairs();
        assert!(pairs.contains(&(HEADER_RETRY_AFTER, "1".to_string())));
    }

    #[test]
    fn test_phase_terminality() {
        assert!(MissionPhase::Completed.is_terminal());
        assert!(MissionPhase::Cancelled.is_terminal());
        assert!(!MissionPhase::Dispatching.is_terminal());
        assert_eq!(MissionPhase::Synthesizing.as_str(), "synthesizing");
    }

    #[test]
    fn export_types() {
        // The export_to attribute in each type's #[ts] macro specifies the output file
        let config = Config::default();
        MissionOwner::export(&config).unwrap();
        MissionSession::export(&config).unwrap();
        ObjectiveAnalysis::export(&config).unwrap();
        AgentContribution::export(&config).unwrap();
        PlanPhase::export(&config).unwrap();
        DetailedPlan::export(&config).unwrap();
        ActionPriority::export(&config).unwrap();
        ActionItem::export(&config).unwrap();
        ResourceRef::export(&config).unwrap();
        RiskEntry::export(&config).unwrap();
        MissionResult::export(&config).unwrap();
        Provenance::export(&config).unwrap();
        MissionPhase::export(&config).unwrap();
        PhaseTransition::export(&config).unwrap();
        MissionProvenance::export(&config).unwrap();
        MissionOutcome::export(&config).unwrap();
        RateLimitConfig::export(&config).unwrap();
        RateLimitDecision::export(&config).unwrap();
        RateWindowStatus::export(&config).unwrap();
    }
}
