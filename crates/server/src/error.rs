use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Orchestrator(#[from] veritas_orchestrator::OrchestratorError),

    #[error(transparent)]
    Audit(#[from] veritas_audit::AuditError),
}

impl From<veritas_core::Error> for ServerError {
    fn from(err: veritas_core::Error) -> Self {
        ServerError::InvalidRequest(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Orchestrator(veritas_orchestrator::OrchestratorError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServerError::Orchestrator(_) => StatusCode::BAD_GATEWAY,
            ServerError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
