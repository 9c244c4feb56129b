//! Process-wide tracing setup.
//!
//! Two sinks: a compact stdout layer for interactive use, and a plain
//! append-only file layer so unattended runs leave a trail. Verbosity is
//! controlled via `RUST_LOG`; the default is `info`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log file, created in the working directory.
pub const DEFAULT_LOG_FILE: &str = "vigil.log";

/// Initialize the global tracing subscriber.
///
/// Must be called once, before the watch loop starts. Fails only if the log
/// file cannot be opened.
pub fn init(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .init();

    Ok(())
}
