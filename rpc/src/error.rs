//! RPC error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use govhub_aggregator::AggregatorError;
use govhub_registry::RegistryError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("metrics disabled")]
    MetricsDisabled,

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownChain(_) | Self::MetricsDisabled => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AggregatorError> for RpcError {
    fn from(e: AggregatorError) -> Self {
        match e {
            AggregatorError::Registry(RegistryError::NotFound(id)) => {
                RpcError::UnknownChain(id.to_string())
            }
            AggregatorError::FetchFailed { .. } => RpcError::Upstream(e.to_string()),
            other => RpcError::Server(other.to_string()),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
