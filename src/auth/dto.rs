use serde::Serialize;

use crate::auth::repo_types::User;

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Response for register and profile.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
    pub user: PublicUser,
}
