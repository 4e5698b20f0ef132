//! Configuration types and fixed bot constants.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Maximum number of photos per listing.
pub const MAX_PHOTOS: usize = 10;

/// Sessions idle longer than this are swept.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often the session sweep runs.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub const WEBSITE_URL: &str = "https://findhomedxb.online/";
pub const AGENT_CONTACT: &str = "wa.me/+97155555555";

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API token.
    pub telegram_token: SecretString,
    /// Supabase project URL (e.g. `https://xyz.supabase.co`).
    pub supabase_url: String,
    /// Supabase service/anon key.
    pub supabase_key: SecretString,
    /// Port for the HTTP health endpoint.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_token = require_env("TELEGRAM_BOT_TOKEN")?;
        let supabase_url = require_env("SUPABASE_URL")?;
        let supabase_key = require_env("SUPABASE_KEY")?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a valid port number: {raw}"),
            })?,
            Err(_) => 3000,
        };

        Ok(Self {
            telegram_token: SecretString::from(telegram_token),
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key: SecretString::from(supabase_key),
            port,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
