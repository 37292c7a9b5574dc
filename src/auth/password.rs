use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::HashingConfig;

fn argon2(cfg: &HashingConfig) -> anyhow::Result<Argon2<'static>> {
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, cfg.params()?))
}

/// Hash a password into a self-describing PHC string with a fresh salt.
pub fn hash_password(plain: &str, cfg: &HashingConfig) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2(cfg)?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored PHC string.
///
/// Cost parameters come from the stored hash, so hashes minted under an older
/// work factor keep verifying. A malformed hash is a non-match.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Hash minted once at startup with the live cost, so verifying against it
/// costs the same as verifying a real user's password.
pub fn dummy_hash(cfg: &HashingConfig) -> anyhow::Result<Arc<str>> {
    let hash = hash_password("dummy-password-never-matches", cfg)
        .context("building dummy password hash")?;
    Ok(hash.into())
}

/// Burn one verification for logins with an unknown username so both
/// failure paths take comparable time.
pub fn verify_against_dummy(plain: &str, dummy: &str) -> bool {
    let _ = verify_password(plain, dummy);
    false
}

/// `hash_password` off the async workers.
pub async fn hash_password_blocking(plain: String, cfg: HashingConfig) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain, &cfg))
        .await
        .context("hashing task panicked")?
}

/// `verify_password` off the async workers. `None` for the hash runs the
/// dummy verification and always fails.
pub async fn verify_password_blocking(
    plain: String,
    hash: Option<String>,
    dummy: Arc<str>,
) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plain, &hash),
        None => verify_against_dummy(&plain, &dummy),
    })
    .await
    .context("verification task panicked")
}
