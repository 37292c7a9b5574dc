//! Payload checks for registration and login.
//!
//! Rules run in order and the first failure wins. The messages are part of
//! the public API contract.

use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::auth::repo_types::{StoreError, User};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 80;
pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No data provided")]
    NoData,
    #[error("Username is required")]
    UsernameRequired,
    #[error("Username must be at least 3 characters long")]
    UsernameTooShort,
    #[error("Username must be at most 80 characters long")]
    UsernameTooLong,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Username already exists")]
    UsernameTaken,
}

/// Registration can also fail on the uniqueness lookup itself.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationCheckError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Username and password pulled out of a validated payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keeps the password out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn object(payload: Option<&Value>) -> Result<&Map<String, Value>, ValidationError> {
    match payload {
        Some(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ValidationError::NoData),
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Shape and length rules for registration; no store access.
pub fn check_registration_shape(payload: Option<&Value>) -> Result<Credentials, ValidationError> {
    let map = object(payload)?;

    let username = string_field(map, "username").trim();
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }
    let username_chars = username.chars().count();
    if username_chars < USERNAME_MIN_CHARS {
        return Err(ValidationError::UsernameTooShort);
    }
    if username_chars > USERNAME_MAX_CHARS {
        return Err(ValidationError::UsernameTooLong);
    }

    let password = string_field(map, "password");
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Full registration rule set, ending with the uniqueness lookup.
///
/// The lookup is a fast path for a friendly message; the UNIQUE index still
/// decides concurrent races at insert time.
pub async fn validate_registration(
    db: &SqlitePool,
    payload: Option<&Value>,
) -> Result<Credentials, RegistrationCheckError> {
    let creds = check_registration_shape(payload)?;
    if User::find_by_username(db, &creds.username).await?.is_some() {
        return Err(ValidationError::UsernameTaken.into());
    }
    Ok(creds)
}

/// Login only checks presence. Whether the user exists is decided later,
/// together with the password, so it cannot leak here.
pub fn validate_login(payload: Option<&Value>) -> Result<Credentials, ValidationError> {
    let map = object(payload)?;

    let username = string_field(map, "username");
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }
    let password = string_field(map, "password");
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;

    fn reg(v: Value) -> Result<Credentials, ValidationError> {
        check_registration_shape(Some(&v))
    }

    #[test]
    fn registration_rules_in_order() {
        assert_eq!(check_registration_shape(None), Err(ValidationError::NoData));
        assert_eq!(reg(json!({})), Err(ValidationError::NoData));
        assert_eq!(reg(json!([1, 2])), Err(ValidationError::NoData));
        assert_eq!(reg(json!("alice")), Err(ValidationError::NoData));
        assert_eq!(
            reg(json!({"password": "password123"})),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            reg(json!({"username": "   ", "password": "password123"})),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            reg(json!({"username": 12345, "password": "password123"})),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            reg(json!({"username": "ab", "password": "password123"})),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            reg(json!({"username": "a".repeat(81), "password": "password123"})),
            Err(ValidationError::UsernameTooLong)
        );
        assert_eq!(
            reg(json!({"username": "newuser"})),
            Err(ValidationError::PasswordRequired)
        );
        assert_eq!(
            reg(json!({"username": "newuser", "password": "12345"})),
            Err(ValidationError::PasswordTooShort)
        );
        // first failure wins: short username is reported before a missing password
        assert_eq!(reg(json!({"username": "ab"})), Err(ValidationError::UsernameTooShort));
    }

    #[test]
    fn registration_bounds_are_inclusive() {
        let ok = reg(json!({"username": "abc", "password": "123456"})).unwrap();
        assert_eq!(ok.username, "abc");
        assert!(reg(json!({"username": "a".repeat(80), "password": "123456"})).is_ok());
    }

    #[test]
    fn registration_trims_username_and_counts_chars() {
        let creds = reg(json!({"username": "  alice  ", "password": "secret12"})).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret12");

        // three scalar values, more than three bytes
        assert!(reg(json!({"username": "äöü", "password": "secret12"})).is_ok());
        assert_eq!(
            reg(json!({"username": " ab ", "password": "secret12"})),
            Err(ValidationError::UsernameTooShort)
        );
    }

    #[test]
    fn messages_match_the_api_contract() {
        assert_eq!(ValidationError::NoData.to_string(), "No data provided");
        assert_eq!(
            ValidationError::UsernameTooLong.to_string(),
            "Username must be at most 80 characters long"
        );
        assert_eq!(ValidationError::UsernameTaken.to_string(), "Username already exists");
    }

    #[test]
    fn login_only_checks_presence() {
        assert_eq!(validate_login(None), Err(ValidationError::NoData));
        assert_eq!(
            validate_login(Some(&json!({"password": "x"}))),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            validate_login(Some(&json!({"username": "testuser"}))),
            Err(ValidationError::PasswordRequired)
        );
        let creds = validate_login(Some(&json!({"username": "ab", "password": "1"}))).unwrap();
        assert_eq!(creds.username, "ab");
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "secret12".into(),
        };
        let out = format!("{creds:?}");
        assert!(out.contains("alice"));
        assert!(!out.contains("secret12"));
    }

    #[tokio::test]
    async fn registration_rejects_taken_username() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::migrate(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ('testuser', 'h')")
            .execute(&pool)
            .await
            .unwrap();

        let taken = json!({"username": "testuser", "password": "anotherpassword"});
        let err = validate_registration(&pool, Some(&taken)).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationCheckError::Invalid(ValidationError::UsernameTaken)
        ));

        let fresh = json!({"username": "newuser", "password": "anotherpassword"});
        assert!(validate_registration(&pool, Some(&fresh)).await.is_ok());
    }
}
