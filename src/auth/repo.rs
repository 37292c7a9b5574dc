use crate::auth::repo_types::{StoreError, User};
use sqlx::{Sqlite, SqliteExecutor, Transaction};

impl User {
    /// Find a user by exact username.
    pub async fn find_by_username<'e>(
        db: impl SqliteExecutor<'e>,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user inside the caller's transaction.
    ///
    /// The UNIQUE index on `username` is the source of truth: a lost race
    /// surfaces as `StoreError::DuplicateUsername` and the caller's
    /// transaction rolls back when dropped.
    pub async fn create(
        tx: &mut Transaction<'_, Sqlite>,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?, ?)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateUsername
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(user)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
