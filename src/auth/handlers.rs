use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginResponse, UserResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{StoreError, User},
        validation::{validate_login, validate_registration, RegistrationCheckError},
    },
    error::AppError,
    state::AppState,
};

const REGISTRATION_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Login failed";
const PROFILE_FAILED: &str = "Failed to retrieve profile";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Option<Json<Value>>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let expose = state.config.expose_error_details();
    let payload = payload.map(|Json(v)| v);

    let creds = match validate_registration(&state.db, payload.as_ref()).await {
        Ok(c) => c,
        Err(RegistrationCheckError::Invalid(e)) => {
            warn!(reason = %e, "registration rejected");
            return Err(e.into());
        }
        Err(RegistrationCheckError::Store(e)) => {
            return Err(AppError::internal(REGISTRATION_FAILED, e, expose));
        }
    };

    let hash = hash_password_blocking(creds.password, state.config.hashing)
        .await
        .map_err(|e| AppError::internal(REGISTRATION_FAILED, e, expose))?;

    // Rolls back on drop unless committed below.
    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::internal(REGISTRATION_FAILED, e, expose))?;

    let user = match User::create(&mut tx, &creds.username, &hash).await {
        Ok(u) => u,
        Err(StoreError::DuplicateUsername) => {
            warn!(username = %creds.username, "username taken at insert");
            return Err(AppError::Conflict);
        }
        Err(e) => return Err(AppError::internal(REGISTRATION_FAILED, e, expose)),
    };

    tx.commit()
        .await
        .map_err(|e| AppError::internal(REGISTRATION_FAILED, e, expose))?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Option<Json<Value>>,
) -> Result<Json<LoginResponse>, AppError> {
    let expose = state.config.expose_error_details();
    let payload = payload.map(|Json(v)| v);

    let creds = validate_login(payload.as_ref()).map_err(|e| {
        warn!(reason = %e, "login rejected");
        AppError::from(e)
    })?;

    let user = User::find_by_username(&state.db, &creds.username)
        .await
        .map_err(|e| AppError::internal(LOGIN_FAILED, e, expose))?;

    // An unknown username still pays for one verification.
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let ok = verify_password_blocking(creds.password, stored_hash, state.dummy_hash.clone())
        .await
        .map_err(|e| AppError::internal(LOGIN_FAILED, e, expose))?;

    let user = match user {
        Some(u) if ok => u,
        Some(u) => {
            warn!(user_id = u.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!(username = %creds.username, "login unknown username");
            return Err(AppError::InvalidCredentials);
        }
    };

    let access_token = JwtKeys::from_ref(&state)
        .sign_access(user.id)
        .map_err(|e| AppError::internal(LOGIN_FAILED, e, expose))?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        access_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            AppError::internal(PROFILE_FAILED, e, state.config.expose_error_details())
        })?
        .ok_or_else(|| {
            warn!(user_id, "token subject no longer exists");
            AppError::NotFound("User not found")
        })?;

    Ok(Json(UserResponse {
        message: "Profile retrieved successfully",
        user: user.into(),
    }))
}
