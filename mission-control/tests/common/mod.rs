//! Local stand-in for the AI service, plus helpers shared by the integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mission_control::actors::RateGovernor;
use mission_control::api::{self, ApiState};
use mission_control::app_state::AppState;
use mission_control::config::MissionConfig;
use mission_control::gateway::HttpInferenceGateway;

/// Agent id the stub answers with HTTP 500
pub const BROKEN_AGENT: &str = "broken";
/// Agent id the stub answers with a body that is not JSON
pub const GARBLED_AGENT: &str = "garbled";

#[derive(Clone, Default)]
pub struct StubAiService {
    pub requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl StubAiService {
    pub fn requests_to(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, path: String, body: Value) {
        self.requests.lock().unwrap().push((path, body));
    }
}

async fn stub_analyze(State(stub): State<StubAiService>, Json(body): Json<Value>) -> Json<Value> {
    stub.record("/api/mission-control/analyze".to_string(), body);
    Json(json!({
        "category": "growth",
        "complexity": "high",
        "requiredExpertise": ["marketing", "finance"],
        "estimatedDuration": "6-8 weeks"
    }))
}

async fn stub_contribute(
    State(stub): State<StubAiService>,
    Path(agent_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    stub.record(format!("/api/agents/{agent_id}/contribute"), body);
    match agent_id.as_str() {
        BROKEN_AGENT => (StatusCode::INTERNAL_SERVER_ERROR, "agent crashed").into_response(),
        GARBLED_AGENT => (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => Json(json!({
            "agentId": agent_id,
            "agentName": format!("Stub {agent_id}"),
            "analysis": format!("{agent_id} reviewed the objective"),
            "recommendations": [format!("{agent_id} recommends a pilot")],
            "resources": ["https://example.com/guide"]
        }))
        .into_response(),
    }
}

async fn stub_synthesize(
    State(stub): State<StubAiService>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let objective = body["objective"].as_str().unwrap_or_default().to_string();
    stub.record("/api/mission-control/synthesize".to_string(), body);
    Json(json!({
        "executiveSummary": format!("Stub plan for {objective}"),
        "detailedPlan": {
            "overview": "Two quick phases",
            "phases": [
                {"name": "Pilot", "description": "Try it", "duration": "1 week", "tasks": ["Launch"]},
                {"name": "Scale", "description": "Grow it", "duration": "3 weeks", "tasks": ["Hire"]}
            ]
        },
        "actionItems": [
            {"id": "a1", "title": "Kickoff", "description": "Meet the team", "priority": "high"}
        ],
        "resources": [
            {"type": "guide", "title": "Playbook", "description": "How to run pilots"}
        ],
        "agentContributions": [],
        "risks": [
            {"risk": "Churn", "impact": "Revenue dip", "mitigation": "Onboarding calls"}
        ],
        "successMetrics": ["Pilot conversion"]
    }))
}

/// Serve the stub on an ephemeral port and return its base URL
pub async fn spawn_stub_ai_service() -> (String, StubAiService) {
    let stub = StubAiService::default();
    let app = Router::new()
        .route("/api/mission-control/analyze", post(stub_analyze))
        .route("/api/agents/{agent_id}/contribute", post(stub_contribute))
        .route("/api/mission-control/synthesize", post(stub_synthesize))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub AI service");
    let addr: SocketAddr = listener.local_addr().expect("Stub has no local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), stub)
}

/// A base URL nothing is listening on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Probe has no local address");
    drop(listener);
    format!("http://{addr}")
}

pub fn test_config(base_url: &str) -> MissionConfig {
    let mut config = MissionConfig::default();
    config.service.base_url = base_url.to_string();
    config.service.call_timeout_ms = 5_000;
    config.governor.sweep_interval_ms = 0;
    config
}

pub async fn setup_test_app(config: MissionConfig) -> axum::Router {
    let (governor, _handle) = RateGovernor::spawn(config.governor.arguments())
        .await
        .expect("Failed to start rate governor");
    let gateway = HttpInferenceGateway::new(config.service.base_url.clone())
        .expect("Failed to build gateway");
    let app_state = Arc::new(AppState::new(config, governor, Arc::new(gateway)));
    api::router().with_state(ApiState { app_state })
}

pub async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value: Value = serde_json::from_slice(&body).unwrap_or_else(|_| {
        json!({ "raw": String::from_utf8_lossy(&body).to_string() })
    });
    (status, headers, value)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
