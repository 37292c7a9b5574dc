use serde::Serialize;
use sqlx::FromRow;

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,                // autoincrement primary key
    pub username: String,       // unique, case-sensitive
    #[serde(skip_serializing)]
    pub password_hash: String,  // Argon2 PHC string, never exposed in JSON
}

/// Failures of the credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
