use anyhow::Context;
use serde::Deserialize;

/// Upper bound for token lifetimes: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// SMTP relay settings. `credentials` is `None` when EMAIL_USER/EMAIL_PASS
/// are missing, in which case mail is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub credentials: Option<(String, String)>,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub frontend_url: String,
    pub backend_url: String,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));
        let number = |key: &str, default: i64| -> anyhow::Result<i64> {
            match var(key) {
                Some(v) => v
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("{key} must be an integer, got {v:?}")),
                None => Ok(default),
            }
        };

        let ttl = |key: &str, default: i64| -> anyhow::Result<i64> {
            let minutes = number(key, default)?;
            anyhow::ensure!(
                (1..=MAX_TTL_MINUTES).contains(&minutes),
                "{key} must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
            );
            Ok(minutes)
        };
        let port = |key: &str, default: i64| -> anyhow::Result<u16> {
            let value = number(key, default)?;
            u16::try_from(value).with_context(|| format!("{key} out of range: {value}"))
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "blogger".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "blogger-users".into()),
            ttl_minutes: ttl("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: ttl("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let mail = MailConfig {
            smtp_host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into()),
            smtp_port: port("SMTP_PORT", 587)?,
            credentials: var("EMAIL_USER").zip(var("EMAIL_PASS")),
            from_name: var("EMAIL_FROM_NAME").unwrap_or_else(|| "Blogger App".into()),
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(v) if v.trim() == "*" => Vec::new(),
            Some(v) => v
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec!["http://localhost:5173".to_string()],
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: port("APP_PORT", 3000)?,
            database_url: required("DATABASE_URL")?,
            jwt,
            mail,
            frontend_url: base_url(var("FRONTEND_URL"), "http://localhost:5173"),
            backend_url: base_url(var("BACKEND_URL"), "http://localhost:3000"),
            cors_origins,
        })
    }
}

fn base_url(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}
