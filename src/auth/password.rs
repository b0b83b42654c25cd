use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("stored digest is not a recognized hash encoding: {0}")]
    InvalidDigest(argon2::password_hash::Error),
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Hash a plaintext password with a fresh random salt. Two calls with the
/// same input produce different digests.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e)
        })?
        .to_string();
    Ok(hash)
}

/// Check a candidate plaintext against a stored digest. A mismatch is
/// `Ok(false)`; only an unparsable digest is an error.
pub fn verify_password(plain: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(PasswordError::InvalidDigest)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// True when the digest was produced with a different algorithm or with cost
/// parameters below the currently configured ones. Decided from the digest's
/// encoded parameters, not by re-running a verification.
pub fn needs_rehash(digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(PasswordError::InvalidDigest)?;
    if parsed.algorithm.as_str() != Algorithm::default().as_str() {
        return Ok(true);
    }
    let params = Params::try_from(&parsed).map_err(PasswordError::InvalidDigest)?;
    let current = Params::default();
    Ok(params.m_cost() < current.m_cost()
        || params.t_cost() < current.t_cost()
        || params.p_cost() < current.p_cost())
}
