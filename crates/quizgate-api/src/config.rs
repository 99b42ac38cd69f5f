//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use quizgate_core::ids::UserId;

use crate::error::AppError;

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bot username used in deep links.
    pub bot_username: String,
    /// The only user allowed on admin routes; admin is disabled when unset.
    pub admin_user_id: Option<UserId>,
    /// Upper bound on every storage call.
    pub storage_timeout: Duration,
    /// Connection pool size.
    pub db_max_connections: u32,
    /// Whether only reported channel members may start a quiz.
    pub require_channel_membership: bool,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let admin_user_id = match lookup("ADMIN_USER_ID") {
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|e| AppError::Config(format!("ADMIN_USER_ID is invalid: {e}")))?,
            ),
            None => None,
        };
        let timeout_ms: u64 = match lookup("STORAGE_TIMEOUT_MS") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("STORAGE_TIMEOUT_MS must be milliseconds: {e}"))
            })?,
            None => 5000,
        };
        if timeout_ms == 0 {
            return Err(AppError::Config(
                "STORAGE_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("DB_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?,
            None => 10,
        };
        let require_channel_membership = match lookup("REQUIRE_CHANNEL_MEMBERSHIP") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(AppError::Config(format!(
                        "REQUIRE_CHANNEL_MEMBERSHIP must be true or false, got {other:?}"
                    )));
                }
            },
            None => false,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            bot_username: required("BOT_USERNAME")?
                .trim()
                .trim_start_matches('@')
                .to_owned(),
            admin_user_id,
            storage_timeout: Duration::from_millis(timeout_ms),
            db_max_connections,
            require_channel_membership,
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
