//! Environment configuration.
//!
//! All credentials come from the environment (a `.env` file is honored if
//! present). Configuration is read once at startup and fixed for the process
//! lifetime.

use std::env;
use thiserror::Error;

/// Homework status API endpoint queried every cycle.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Environment variables that must be set for the watcher to start.
pub const REQUIRED_VARS: [&str; 3] = ["PRACTICUM_TOKEN", "TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth token for the homework status API.
    pub practicum_token: String,
    /// Telegram bot token.
    pub telegram_token: String,
    /// Telegram chat the notifications go to.
    pub telegram_chat_id: String,
    /// Status API endpoint; overridable via `VIGIL_ENDPOINT`.
    pub endpoint: String,
}

impl Config {
    /// Read configuration from the environment, loading `.env` first if one
    /// exists.
    ///
    /// Every missing required variable is collected and reported together,
    /// so a deployment with two absent credentials learns about both at
    /// once. An empty or whitespace-only value counts as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut missing = Vec::new();
        let practicum_token = require("PRACTICUM_TOKEN", &mut missing);
        let telegram_token = require("TELEGRAM_TOKEN", &mut missing);
        let telegram_chat_id = require("TELEGRAM_CHAT_ID", &mut missing);

        match (practicum_token, telegram_token, telegram_chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) => Ok(Self {
                practicum_token,
                telegram_token,
                telegram_chat_id,
                endpoint: env::var("VIGIL_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            }),
            _ => Err(ConfigError::MissingVars(missing)),
        }
    }
}

fn require(name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            missing.push(name);
            None
        }
    }
}
