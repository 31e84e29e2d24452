use std::{env, fmt::Display, str::FromStr, time::Duration};

use derive_more::Display;
use log::{info, warn};

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "environment variable '{}' must be set", _0)]
    Missing(&'static str),

    #[display(fmt = "environment variable '{}' is invalid: {}", _0, _1)]
    Invalid(&'static str, String),
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub allowed_origins: Vec<String>,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub currency: String,
    pub external_timeout: Duration,
    pub resend_api_key: Option<String>,
    pub resend_from_email: String,
    pub resend_api_base: String,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let production = var("RUST_ENV").map(|v| v == "production").unwrap_or(false);
        let allowed_origins = parse_origins(var("ALLOWED_ORIGINS"), production)?;
        let timeout_secs: u64 = parse_or("PAYMENT_TIMEOUT_SECS", var("PAYMENT_TIMEOUT_SECS"), 10)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", var("DATABASE_MAX_CONNECTIONS"), 5)?,
            jwt_secret: required("JWT_SECRET")?,
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", var("PORT"), 5002)?,
            production,
            allowed_origins,
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_api_base: var("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string()),
            currency: var("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".to_string()).to_lowercase(),
            external_timeout: Duration::from_secs(timeout_secs),
            resend_api_key: var("RESEND_API_KEY"),
            resend_from_email: var("RESEND_FROM_EMAIL").unwrap_or_else(|| "invitations@localhost".to_string()),
            resend_api_base: var("RESEND_API_BASE").unwrap_or_else(|| "https://api.resend.com".to_string()),
            frontend_url: var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match raw {
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid(key, e.to_string())),
        None => Ok(default),
    }
}

/// One allow-list for every environment. Production refuses to start without it.
fn parse_origins(raw: Option<String>, production: bool) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            let valid = origin.starts_with("http://") || origin.starts_with("https://");
            if !valid {
                warn!("Ignoring invalid ALLOWED_ORIGINS entry: {}", origin);
            }
            valid
        })
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect();

    if !origins.is_empty() {
        return Ok(origins);
    }
    if production {
        return Err(ConfigError::Missing("ALLOWED_ORIGINS"));
    }
    info!("ALLOWED_ORIGINS not set, allowing local development origins");
    Ok(DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect())
}
