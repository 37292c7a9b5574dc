use crate::auth::password::dummy_hash;
use crate::config::AppConfig;
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    /// Verified against when a login names an unknown user.
    pub dummy_hash: Arc<str>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url, config.database_max_connections).await?;
        db::migrate(&db).await?;

        let state = Self::from_parts(db, config)?;
        tracing::info!(env = ?state.config.env, "credential store ready");
        Ok(state)
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let dummy_hash = dummy_hash(&config.hashing)?;
        Ok(Self {
            db,
            config,
            dummy_hash,
        })
    }

    /// Fresh in-memory store with the cheap hashing preset.
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        use crate::config::{Environment, HashingConfig, JwtConfig};

        let db = db::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory pool");
        db::migrate(&db).await.expect("migrations");

        let config = Arc::new(AppConfig {
            env: Environment::Testing,
            database_url: "sqlite::memory:".into(),
            database_max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
            },
            hashing: HashingConfig::for_env(Environment::Testing),
        });

        Self::from_parts(db, config).expect("test state")
    }
}
