//! Status API client.
//!
//! One blocking GET per poll cycle, carrying the OAuth credential and the
//! `from_date` query window. The client applies no internal retry: one call,
//! one outcome. The body is decoded to untyped JSON and handed to the
//! validator unchecked.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod validate;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Source of raw status API responses, keyed by the query window start.
///
/// The watcher depends on this seam rather than on the concrete client, so
/// cycles can be driven without a network in tests.
pub trait StatusSource {
    fn fetch(&self, from_date: i64) -> Result<Value, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport could not complete the request (DNS, timeout, refused
    /// connection, TLS).
    #[error("request to the status API failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("status API returned HTTP {0}")]
    UnexpectedStatus(u16),

    /// A body arrived but is not valid JSON.
    #[error("status API returned a body that is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Blocking HTTP client for the homework status endpoint.
pub struct StatusClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl StatusClient {
    /// Create a client with explicit connect and request timeouts so a dead
    /// endpoint surfaces as a contained `Connection` failure instead of a
    /// stalled loop.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        })
    }
}

impl StatusSource for StatusClient {
    fn fetch(&self, from_date: i64) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .map_err(FetchError::Connection)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        response.json().map_err(FetchError::Decode)
    }
}
