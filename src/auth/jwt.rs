use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, state::AppState};

pub const DEFAULT_ROLE: &str = "user";

/// Authorization block nested inside the session token, in the claim layout
/// the data service expects.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleClaims {
    #[serde(rename = "x-hasura-allowed-roles")]
    pub allowed_roles: Vec<String>,
    #[serde(rename = "x-hasura-default-role")]
    pub default_role: String,
    #[serde(rename = "x-hasura-user-id")]
    pub user_id: i64,
}

/// Full claim set of an issued session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "https://hasura.io/jwt/claims")]
    pub authorization: RoleClaims,
    pub exp: usize,
}

/// Holds the signing key and token lifetime. Verification is a downstream
/// concern; this side only issues.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_hours } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_hours as u64) * 3600),
        }
    }
}

impl JwtKeys {
    /// Sign a session token for the given user with the fixed "user" role
    /// and an expiry of now + ttl.
    pub fn issue(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = OffsetDateTime::now_utc() + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            authorization: RoleClaims {
                allowed_roles: vec![DEFAULT_ROLE.to_string()],
                default_role: DEFAULT_ROLE.to_string(),
                user_id,
            },
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "session token signed");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn make_keys(secret: &str, ttl_hours: u64) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs(ttl_hours * 3600),
        }
    }

    #[test]
    fn issued_token_carries_identity_and_role() {
        let keys = make_keys("dev-secret", 24);
        let token = keys.issue(42).expect("issue token");

        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"dev-secret"),
            &Validation::default(),
        )
        .expect("decode token");
        assert_eq!(decoded.claims.authorization.user_id, 42);
        assert_eq!(decoded.claims.authorization.default_role, "user");
        assert_eq!(decoded.claims.authorization.allowed_roles, vec!["user"]);
    }

    #[test]
    fn expiry_is_roughly_a_day_out() {
        let keys = make_keys("dev-secret", 24);
        let token = keys.issue(1).expect("issue token");
        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"dev-secret"),
            &Validation::default(),
        )
        .expect("decode token");

        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let day = 24 * 3600;
        assert!(decoded.claims.exp > now + day - 60);
        assert!(decoded.claims.exp <= now + day + 60);
    }

    #[test]
    fn token_does_not_verify_with_another_key() {
        let keys = make_keys("dev-secret", 24);
        let token = keys.issue(1).expect("issue token");
        let err = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        )
        .unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
