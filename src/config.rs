use anyhow::Context;
use argon2::Params;
use serde::Deserialize;

const DEV_JWT_SECRET: &str = "jwt-secret-key-change-in-production";

/// One year. Keeps `now + ttl` well inside the representable date range.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Deployment flavour, selected with `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    fn from_env_value(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "testing" | "test" => Ok(Self::Testing),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("unknown APP_ENV value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingConfig {
    pub fn for_env(env: Environment) -> Self {
        match env {
            Environment::Testing => Self {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            // argon2 crate defaults (OWASP minimum for Argon2id)
            _ => Self {
                memory_kib: 19 * 1024,
                iterations: 2,
                parallelism: 1,
            },
        }
    }

    pub fn params(&self) -> anyhow::Result<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: Environment,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let env = match std::env::var("APP_ENV") {
            Ok(v) => Environment::from_env_value(&v)?,
            Err(_) => Environment::Development,
        };

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| match env {
            Environment::Testing => "sqlite::memory:".into(),
            _ => "sqlite://users.db".into(),
        });

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ if env == Environment::Production => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            _ => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.into()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gatekeeper".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "gatekeeper-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES").unwrap_or(60),
        };

        let defaults = HashingConfig::for_env(env);
        let hashing = HashingConfig {
            memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: parse_var("PASSWORD_HASH_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: parse_var("PASSWORD_HASH_PARALLELISM").unwrap_or(defaults.parallelism),
        };

        let cfg = Self {
            env,
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(10),
            jwt,
            hashing,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would otherwise only fail once requests arrive.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_TTL_MINUTES).contains(&self.jwt.ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
                self.jwt.ttl_minutes
            );
        }
        self.hashing
            .params()
            .context("PASSWORD_HASH_* settings rejected")?;
        Ok(())
    }

    /// Whether 500 responses may carry the underlying error text.
    pub fn expose_error_details(&self) -> bool {
        self.env != Environment::Production
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
