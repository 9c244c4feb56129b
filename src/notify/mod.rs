//! Telegram notification delivery.
//!
//! One outbound `sendMessage` per notable event, to a single fixed chat.
//! Delivery is best-effort from the loop's point of view: the watcher logs a
//! failed send and moves on, since the notifier is itself the loop's
//! failure-reporting channel.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Destination for notification text.
///
/// The watcher depends on this seam rather than on the concrete Telegram
/// client, so delivery can be observed (and made to fail) in tests.
pub trait MessageSink {
    fn send(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request to the Telegram API failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("Telegram API returned HTTP {0}")]
    UnexpectedStatus(u16),

    /// The request went through but Telegram answered `"ok": false`.
    #[error("Telegram API rejected the request: {0}")]
    Rejected(String),
}

/// Response envelope shared by all Bot API methods.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// Bot API client bound to one bot token and one destination chat.
pub struct TelegramNotifier {
    http: Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Result<Self> {
        Self::with_base_url(TELEGRAM_API_BASE, token, chat_id)
    }

    /// Like [`TelegramNotifier::new`] but against a custom API host.
    pub fn with_base_url(base_url: &str, token: &str, chat_id: &str) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Verify the bot credential by calling `getMe`; returns the bot
    /// username. Used by `doctor`, never by the watch loop.
    pub fn probe(&self) -> Result<String, NotifyError> {
        let url = format!("{}/bot{}/getMe", self.base_url, self.token);
        let envelope = self.call(self.http.get(&url))?;

        Ok(envelope
            .result
            .as_ref()
            .and_then(|me| me.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    fn call(&self, request: reqwest::blocking::RequestBuilder) -> Result<ApiEnvelope, NotifyError> {
        let response = request.send().map_err(NotifyError::Connection)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::UnexpectedStatus(status.as_u16()));
        }

        let envelope: ApiEnvelope = response.json().map_err(NotifyError::Connection)?;
        if !envelope.ok {
            return Err(NotifyError::Rejected(
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }

        Ok(envelope)
    }
}

impl MessageSink for TelegramNotifier {
    fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let payload = json!({ "chat_id": self.chat_id, "text": text });

        self.call(self.http.post(&url).json(&payload))?;
        Ok(())
    }
}
