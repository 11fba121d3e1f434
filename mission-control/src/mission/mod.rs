//! Mission orchestration - analyze, fan out to agents, synthesize
//!
//! ```text
//! received → analyzing → dispatching → synthesizing → completed
//!     \__________\_____________\______________\______→ cancelled
//! ```
//!
//! Each stage owns its failure handling: a failed, timed-out or malformed
//! call is replaced by a deterministic fallback tagged `Provenance::Fallback`,
//! so a run only fails on bad input or cancellation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let runtime = StageRuntime::new(governor, gateway, config.service.call_timeout());
//! let orchestrator = MissionOrchestrator::new(runtime, &config);
//!
//! let result = orchestrator.orchestrate(&session).await?;
//! ```

pub mod analyzer;
pub mod dispatcher;
pub mod fallback;
pub mod orchestrator;
mod runtime;
pub mod state;
pub mod synthesizer;

#[cfg(test)]
mod tests;

use mission_types::MissionPhase;

pub use analyzer::ObjectiveAnalyzer;
pub use dispatcher::AgentDispatcher;
pub use orchestrator::{MissionOrchestrator, ProgressSender};
pub use runtime::StageRuntime;
pub use state::MissionState;
pub use synthesizer::ResultSynthesizer;

/// Rate-limit key for objective analysis calls
pub const ANALYZE_KEY: &str = "mission.analyze";
/// Rate-limit key for synthesis calls
pub const SYNTHESIZE_KEY: &str = "mission.synthesize";
/// Rate-limit key (or key prefix, per agent) for contribution calls
pub const CONTRIBUTE_KEY: &str = "mission.contribute";

/// Errors that end an orchestration run
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MissionError {
    #[error("invalid mission session: {0}")]
    InvalidSession(String),
    #[error("mission cancelled while {}", .0.as_str())]
    Cancelled(MissionPhase),
    #[error("invalid mission transition from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition { from: MissionPhase, to: MissionPhase },
}
