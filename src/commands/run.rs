//! The `run` subcommand: configure, then watch until told to stop.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;
use tracing::{error, info};

use crate::api::validate::ApiContract;
use crate::api::StatusClient;
use crate::config::Config;
use crate::logging::{self, DEFAULT_LOG_FILE};
use crate::notify::TelegramNotifier;
use crate::watcher::{Watcher, DEFAULT_POLL_INTERVAL};

/// Start the watch loop.
///
/// The configuration check is the one fatal, non-retried condition: a
/// missing credential is logged at top severity and aborts the process
/// before the loop starts. Everything after that is contained per-cycle.
pub fn execute(
    interval: Option<u64>,
    from_date: Option<i64>,
    legacy_cursor: bool,
    log_file: Option<PathBuf>,
) -> Result<()> {
    let log_path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    logging::init(&log_path)?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration check failed: {err}");
            bail!("configuration check failed: {err}");
        }
    };

    if let Some(ts) = from_date {
        if ts < 0 {
            bail!("--from-date must be a non-negative Unix timestamp (got {ts})");
        }
    }

    let contract = if legacy_cursor {
        ApiContract::V1
    } else {
        ApiContract::V2
    };
    let interval = interval.map(Duration::from_secs).unwrap_or(DEFAULT_POLL_INTERVAL);
    let cursor = from_date.unwrap_or_else(|| Utc::now().timestamp());

    let source = StatusClient::new(&config.endpoint, &config.practicum_token)?;
    let sink = TelegramNotifier::new(&config.telegram_token, &config.telegram_chat_id)?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    info!("configuration loaded, endpoint={}", config.endpoint);

    let mut watcher = Watcher::new(source, sink, contract, cursor);
    watcher.run(interval, &stop);

    Ok(())
}
