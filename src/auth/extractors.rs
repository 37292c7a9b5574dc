use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Verified bearer token, resolved to the user ID it was issued for.
///
/// Put it in a handler's arguments to guard the route.
#[derive(Debug)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            warn!("missing Authorization header");
            return Err(AppError::InvalidToken);
        };

        // Expect "Bearer <token>"
        let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        else {
            warn!("invalid auth scheme");
            return Err(AppError::InvalidToken);
        };

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token.trim()).and_then(|claims| claims.user_id()) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(e) => {
                warn!(reason = %e, "token rejected");
                Err(AppError::InvalidToken)
            }
        }
    }
}
