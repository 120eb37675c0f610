//! API error types and responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use invite_core::{DispatchError, InvitationError, ResolutionError, SigningError};

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Resolution(ResolutionError),

    #[error(transparent)]
    Signing(SigningError),

    #[error(transparent)]
    Dispatch(DispatchError),

    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Resolution(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Resolution(_) | ApiError::Signing(_) | ApiError::Dispatch(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Resolution(err) => match err {
                ResolutionError::NoVault { .. } => "NO_VAULT",
                ResolutionError::NoKey { .. } => "NO_KEY",
                ResolutionError::NoContract { .. } => "NO_CONTRACT",
                ResolutionError::UnknownOrganization { .. } => "UNKNOWN_ORGANIZATION",
                ResolutionError::NoMessagingEndpoint { .. } => "NO_MESSAGING_ENDPOINT",
                ResolutionError::Transport { .. } => "UPSTREAM_UNAVAILABLE",
            },
            ApiError::Signing(_) => "SIGNING_FAILED",
            ApiError::Dispatch(_) => "DISPATCH_FAILED",
            ApiError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Resolution(ResolutionError::Transport {
                operation,
                transient,
                ..
            }) => Some(json!({
                "operation": operation,
                "transient": transient,
            })),
            ApiError::Signing(err) => Some(json!({
                "vault_id": err.vault_id,
                "key_id": err.key_id,
                "cause": err.cause.to_string(),
            })),
            ApiError::Dispatch(err) => Some(json!({
                "jti": err.token_id,
                "status": err.status,
                "transient": err.transient,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details: self.details(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<InvitationError> for ApiError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            InvitationError::Resolution(err) => ApiError::Resolution(err),
            InvitationError::Signing(err) => ApiError::Signing(err),
            InvitationError::Dispatch(err) => ApiError::Dispatch(err),
            InvitationError::DeadlineExceeded(deadline) => ApiError::DeadlineExceeded(deadline),
            InvitationError::Encoding(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_core::SigningFailure;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(InvitationError::from(ResolutionError::NoKey {
            vault_id: "vault-1".into(),
            spec: "RSA-4096".into(),
        }));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), "NO_KEY");

        let unreachable = ApiError::from(InvitationError::from(ResolutionError::Transport {
            operation: "list vaults".into(),
            message: "connection refused".into(),
            transient: true,
        }));
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);

        let signing = ApiError::from(InvitationError::from(SigningError::new(
            "vault-1",
            "rsa-1",
            SigningFailure::MissingSignature,
        )));
        assert_eq!(signing.status(), StatusCode::BAD_GATEWAY);

        let deadline = ApiError::from(InvitationError::DeadlineExceeded(Duration::from_secs(30)));
        assert_eq!(deadline.status(), StatusCode::GATEWAY_TIMEOUT);

        let invalid = ApiError::from(InvitationError::InvalidRequest("email is required".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_dispatch_details_carry_jti() {
        let err = ApiError::Dispatch(
            DispatchError::new("a@b.com", "user already invited")
                .with_status(422)
                .with_token_id("jti-1"),
        );
        let details = err.details().unwrap();
        assert_eq!(details["jti"], "jti-1");
        assert_eq!(details["status"], 422);
    }
}
