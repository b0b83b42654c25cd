use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{auth::password::PasswordError, data::DataServiceError};

/// Everything a signup or login request can fail with. Each variant carries
/// a fixed client-facing message; upstream detail is logged, never leaked.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid request payload")]
    InvalidPayload,
    #[error("Failed to create user")]
    UserCreationFailed(#[source] DataServiceError),
    #[error("Failed to create user")]
    Hashing(#[source] PasswordError),
    #[error("Failed to fetch user")]
    UserFetchFailed(#[source] DataServiceError),
    #[error("Invalid user data")]
    InvalidUserData(#[source] DataServiceError),
    #[error("Invalid user data")]
    CorruptDigest(#[source] PasswordError),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Failed to generate token")]
    TokenCreation(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidPayload => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserCreationFailed(_)
            | AuthError::Hashing(_)
            | AuthError::UserFetchFailed(_)
            | AuthError::InvalidUserData(_)
            | AuthError::CorruptDigest(_)
            | AuthError::TokenCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_payload_maps_to_400() {
        assert_eq!(AuthError::InvalidPayload.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_credentials_maps_to_401() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn upstream_failures_map_to_500() {
        let err = AuthError::UserFetchFailed(DataServiceError::MissingData);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_body_is_fixed_per_variant() {
        assert_eq!(
            AuthError::UserCreationFailed(DataServiceError::MissingData).to_string(),
            "Failed to create user"
        );
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
