//! Routes: scan, correct, audit list/verify, health.

use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use veritas_core::{Domain, ScanMode, ScanResult};
use veritas_orchestrator::CorrectionResult;

use crate::error::ServerError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.server.body_limit_bytes;

    Router::new()
        .route("/v1/scan", post(scan))
        .route("/v1/correct", post(correct))
        .route("/v1/audit", get(list_audit))
        .route("/v1/audit/verify", get(verify_audit))
        .route("/healthz", get(healthz))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    text: String,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_domain")]
    domain: String,
}

fn default_mode() -> String {
    "local".to_string()
}

fn default_domain() -> String {
    "general".to_string()
}

async fn scan(State(state): State<AppState>, Json(request): Json<ScanRequest>) -> Result<Json<ScanResult>, ServerError> {
    let mode = ScanMode::parse(&request.mode)?;
    let domain = Domain::parse(&request.domain)?;
    let result = state.orchestrator.scan(&request.text, mode, domain).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct CorrectRequest {
    text: String,
    scan_result: ScanResult,
    #[serde(default = "default_domain")]
    domain: String,
    #[serde(default)]
    max_iterations: Option<u32>,
}

async fn correct(State(state): State<AppState>, Json(request): Json<CorrectRequest>) -> Result<Json<CorrectionResult>, ServerError> {
    let domain = Domain::parse(&request.domain)?;
    let max_iterations = request.max_iterations.unwrap_or(state.settings.corrector.max_iterations);
    let result = state.orchestrator.correct(&request.text, &request.scan_result, domain, max_iterations).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct AuditListQuery {
    #[serde(default = "default_audit_limit")]
    limit: i64,
    #[serde(default)]
    event_type: Option<String>,
}

fn default_audit_limit() -> i64 {
    50
}

async fn list_audit(State(state): State<AppState>, Query(query): Query<AuditListQuery>) -> Result<impl IntoResponse, ServerError> {
    let entries = state.orchestrator.audit().recent(query.limit, query.event_type.as_deref()).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
struct AuditVerifyQuery {
    #[serde(default = "default_verify_limit")]
    limit: i64,
}

fn default_verify_limit() -> i64 {
    1000
}

async fn verify_audit(State(state): State<AppState>, Query(query): Query<AuditVerifyQuery>) -> Result<impl IntoResponse, ServerError> {
    let report = state.orchestrator.audit().verify(query.limit).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    core_version: &'static str,
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(Health { status: "ok", core_version: state.orchestrator.registry().core_version() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;
    use veritas_audit::AuditChain;
    use veritas_config::Settings;
    use veritas_orchestrator::Orchestrator;
    use veritas_registry::PatternRegistry;

    async fn test_state() -> AppState {
        let audit = std::sync::Arc::new(AuditChain::connect("sqlite::memory:").await.unwrap());
        let orchestrator = Orchestrator::new(PatternRegistry::new(), None, audit, None);
        AppState::new(orchestrator, Settings::default())
    }

    #[tokio::test]
    async fn router_builds_and_healthz_reports_ok() {
        let state = test_state().await;
        let app = create_router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/healthz").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn local_scan_via_http_returns_200() {
        let state = test_state().await;
        let app = create_router(state);
        let body = serde_json::to_vec(&serde_json::json!({"text": "studies show everyone agrees this is settled"})).unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/scan")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_scan_mode_returns_400() {
        let state = test_state().await;
        let app = create_router(state);
        let body = serde_json::to_vec(&serde_json::json!({"text": "hello", "mode": "quantum"})).unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/scan")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_domain_returns_400() {
        let state = test_state().await;
        let app = create_router(state);
        let body = serde_json::to_vec(&serde_json::json!({"text": "hello", "domain": "astrology"})).unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/scan")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn correct_without_llm_provider_returns_400() {
        let state = test_state().await;
        let app = create_router(state);
        let scan_result = serde_json::json!({
            "text": "studies show everyone agrees",
            "truth_score": 60,
            "knowledge_type": "sense",
            "bias_detected": true,
            "bias_types": [],
            "pit_tier": null,
            "pit_detail": null,
            "severity": null,
            "confidence": 0.5,
            "explanation": "",
            "flags": [],
            "impact_projection": null,
            "scan_mode": "local",
            "source": "local",
            "core_version": "0.0.0",
            "audit_hash": null,
            "score_breakdown": null,
            "learning_proposals": null,
        });
        let body = serde_json::to_vec(&serde_json::json!({
            "text": "studies show everyone agrees",
            "scan_result": scan_result,
        }))
        .unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/correct")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        // No provider configured in test_state(): the orchestrator reports
        // this as an invalid-input condition, mapped to 400.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn audit_list_returns_empty_chain() {
        let state = test_state().await;
        let app = create_router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/v1/audit?limit=10").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn audit_verify_on_empty_chain_reports_ok() {
        let state = test_state().await;
        let app = create_router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/v1/audit/verify").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let state = test_state().await;
        let body_limit = state.settings.server.body_limit_bytes;
        let app = create_router(state);
        let oversized_text = "a".repeat(body_limit + 1);
        let body = serde_json::to_vec(&serde_json::json!({"text": oversized_text})).unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/scan")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
