use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

/// Session cookie settings. Max-Age always follows `JwtConfig::ttl_days`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Bootstrap admin account created or promoted at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub password: PasswordConfig,
    pub admin: Option<AdminSeed>,
    /// Browser origins allowed to send credentialed requests. Empty means
    /// permissive CORS without credentials.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authkit".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authkit-users".into()),
            ttl_days: parse_env("JWT_TTL_DAYS").unwrap_or(30),
        };

        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "token".into()),
            secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| !matches!(v.trim(), "false" | "0"))
                .unwrap_or(true),
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_env("ARGON2_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: parse_env("ARGON2_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: parse_env("ARGON2_PARALLELISM").unwrap_or(defaults.parallelism),
        };

        let admin = match (
            std::env::var("ADMIN_NAME"),
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(name), Ok(email), Ok(password)) => Some(AdminSeed {
                name,
                email,
                password,
            }),
            (Err(_), Err(_), Err(_)) => None,
            _ => anyhow::bail!("ADMIN_NAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .or_else(|_| std::env::var("CLIENT_URL"))
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            jwt,
            session,
            password,
            admin,
            cors_origins,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
