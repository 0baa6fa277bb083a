use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use mingle_auth::TokenError;
use mingle_graph::GraphError;
use mingle_types::api::MessageResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session token expired")]
    TokenExpired,
    #[error("session token malformed")]
    TokenMalformed,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::MalformedSignature | TokenError::ClaimMissing => ApiError::TokenMalformed,
            TokenError::Encoding => {
                ApiError::Internal(anyhow::anyhow!("session token encoding failed"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthenticated
            | ApiError::InvalidCredentials
            | ApiError::TokenExpired
            | ApiError::TokenMalformed => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Graph(GraphError::NotFound) => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            ApiError::Graph(GraphError::AlreadyExists) => {
                (StatusCode::BAD_REQUEST, "already exists".to_string())
            }
            ApiError::Graph(e) => {
                error!("graph operation failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}
