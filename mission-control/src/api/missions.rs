//! Mission API endpoints
//!
//! Orchestration requests are admitted per user through the shared
//! RateGovernor before any AI-service call is made.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use mission_types::{MissionContext, MissionOwner, MissionSession, RateLimitHeaders};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::api::{error_response, ApiErrorCode, ApiState};
use crate::mission::orchestrator::validate_session;
use crate::mission::MissionError;

/// Rate-limit key prefix for inbound orchestration requests
pub const API_USER_KEY_PREFIX: &str = "api.user";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrateRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 10, message = "objective must be at least 10 characters"))]
    pub objective: String,
    #[serde(default)]
    pub agents_involved: Vec<String>,
    #[serde(default)]
    pub context: MissionContext,
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
}

impl OrchestrateRequest {
    fn into_session(self) -> MissionSession {
        MissionSession {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| ulid::Ulid::new().to_string()),
            objective: self.objective,
            agents_involved: self.agents_involved,
            context: self.context,
            owner: MissionOwner {
                id: self.user_id,
                email: self.email,
            },
        }
    }
}

pub fn api_rate_key(user_id: &str) -> String {
    format!("{API_USER_KEY_PREFIX}:{user_id}")
}

/// POST /missions/orchestrate - Run one mission and return its outcome
pub async fn orchestrate_mission(
    State(state): State<ApiState>,
    payload: Result<Json<OrchestrateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(ApiErrorCode::InvalidRequest, rejection.body_text());
        }
    };
    if let Err(errors) = request.validate() {
        return error_response(ApiErrorCode::InvalidRequest, errors.to_string());
    }

    let session = request.into_session();
    if let Err(MissionError::InvalidSession(message)) = validate_session(&session) {
        return error_response(ApiErrorCode::InvalidRequest, message);
    }

    let app = &state.app_state;
    let limit = app.config().limits.api.rate_limit();
    let decision = match app
        .governor()
        .check_limit(&api_rate_key(&session.owner.id), limit)
        .await
    {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(error = %e, "Rate governor unavailable");
            return error_response(ApiErrorCode::InternalError, e.to_string());
        }
    };
    let headers = RateLimitHeaders::from_decision(&limit, &decision);

    if !decision.allowed {
        tracing::info!(
            user_id = %session.owner.id,
            retry_after = ?decision.retry_after,
            "Orchestration request rate limited"
        );
        return (
            AppendHeaders(headers.to_pairs()),
            error_response(
                ApiErrorCode::RateLimited,
                "Too many requests, please try again later",
            ),
        )
            .into_response();
    }

    let cancel = CancellationToken::new();
    // Dropping the request future (client went away) cancels the run
    let _cancel_on_drop = cancel.clone().drop_guard();

    match app
        .orchestrator()
        .orchestrate_with(&session, &cancel, None)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            AppendHeaders(headers.to_pairs()),
            Json(outcome),
        )
            .into_response(),
        Err(MissionError::InvalidSession(message)) => {
            error_response(ApiErrorCode::InvalidRequest, message)
        }
        Err(e) => {
            tracing::error!(session_id = %session.id, error = %e, "Mission orchestration failed");
            error_response(ApiErrorCode::InternalError, e.to_string())
        }
    }
}

/// GET /rate-limits/{key} - Inspect one rate-limit window
pub async fn get_rate_limit_status(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Response {
    match state.app_state.governor().status(&key).await {
        Ok(Some(status)) => (StatusCode::OK, Json(status)).into_response(),
        Ok(None) => error_response(
            ApiErrorCode::RateLimitNotFound,
            format!("No rate limit window for {key}"),
        ),
        Err(e) => error_response(ApiErrorCode::InternalError, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(objective: &str) -> OrchestrateRequest {
        OrchestrateRequest {
            id: None,
            objective: objective.to_string(),
            agents_involved: vec![],
            context: MissionContext::new(),
            user_id: "user-1".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_short_objective_fails_validation() {
        assert!(request("Too short").validate().is_err());
        assert!(request("Long enough objective").validate().is_ok());
    }

    #[test]
    fn test_bad_email_fails_validation() {
        let mut req = request("Long enough objective");
        req.email = Some("not-an-email".to_string());
        assert!(req.validate().is_err());
        req.email = Some("founder@example.com".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_session_gets_generated_id_when_missing() {
        let session = request("Long enough objective").into_session();
        assert_eq!(session.id.len(), 26);
        assert_eq!(session.owner.id, "user-1");

        let mut with_id = request("Long enough objective");
        with_id.id = Some("mission-42".to_string());
        assert_eq!(with_id.into_session().id, "mission-42");
    }

    #[test]
    fn test_api_rate_key_is_per_user() {
        assert_eq!(api_rate_key("u-9"), "api.user:u-9");
    }
}
