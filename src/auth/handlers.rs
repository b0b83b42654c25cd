use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest, TokenResponse},
        jwt::JwtKeys,
        password,
    },
    data::{CreatedUser, DataServiceError, StoredUser},
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Network-level failures keep the "fetch failed" message; a response we got
/// but could not make sense of is reported as bad user data.
fn fetch_error(err: DataServiceError) -> AuthError {
    match err {
        e @ (DataServiceError::Transport(_) | DataServiceError::Status { .. }) => {
            AuthError::UserFetchFailed(e)
        }
        e => AuthError::InvalidUserData(e),
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUser>), AuthError> {
    let Json(mut payload) = payload.map_err(|_| AuthError::InvalidPayload)?;
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.trim().is_empty()
        || payload.password.is_empty()
        || !is_valid_email(&payload.email)
    {
        warn!("signup rejected: malformed payload");
        return Err(AuthError::InvalidPayload);
    }

    let digest = password::hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AuthError::Hashing(e)
    })?;

    let user = state
        .data
        .create_user(&payload.username, &payload.email, &digest)
        .await
        .map_err(|e| {
            error!(error = %e, email = %payload.email, "create user failed");
            AuthError::UserCreationFailed(e)
        })?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(mut payload) = payload.map_err(|_| AuthError::InvalidPayload)?;
    payload.email = payload.email.trim().to_lowercase();

    if payload.password.is_empty() || !is_valid_email(&payload.email) {
        warn!("login rejected: malformed payload");
        return Err(AuthError::InvalidPayload);
    }

    let user = match state.data.find_user_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        // Unknown email is reported exactly like a wrong password.
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_user_by_email failed");
            return Err(fetch_error(e));
        }
    };

    let ok = password::verify_password(&payload.password, &user.password).map_err(|e| {
        error!(error = %e, user_id = user.id, "stored digest unreadable");
        AuthError::CorruptDigest(e)
    })?;

    if !ok {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(user.id).map_err(|e| {
        error!(error = %e, user_id = user.id, "token signing failed");
        AuthError::TokenCreation(e)
    })?;

    // Best-effort digest upgrade; the response never waits on it and its
    // failures are only logged.
    tokio::spawn(rehash_if_needed(state.clone(), user, payload.password));

    info!(email = %payload.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}

async fn rehash_if_needed(state: AppState, user: StoredUser, plaintext: String) {
    let stale = match password::needs_rehash(&user.password) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, user_id = user.id, "rehash check failed");
            return;
        }
    };
    if !stale {
        return;
    }

    let digest = match password::hash_password(&plaintext) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, user_id = user.id, "rehash failed");
            return;
        }
    };
    match state.data.update_password(user.id, &digest).await {
        Ok(()) => info!(user_id = user.id, "stored digest upgraded"),
        Err(e) => warn!(error = %e, user_id = user.id, "rehashed digest not persisted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_rejects_empty_and_garbage() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("a@x.com"));
    }

    #[test]
    fn transport_failures_keep_the_fetch_failed_message() {
        let err = fetch_error(DataServiceError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        });
        assert!(matches!(err, AuthError::UserFetchFailed(_)));
    }

    #[test]
    fn decode_failures_become_invalid_user_data() {
        let err = fetch_error(DataServiceError::MissingData);
        assert!(matches!(err, AuthError::InvalidUserData(_)));
    }
}
