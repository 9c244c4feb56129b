//! The `doctor` subcommand: diagnose configuration and connectivity without
//! entering the watch loop.

use anyhow::{bail, Result};
use chrono::Utc;
use colored::Colorize;
use std::env;

use crate::api::validate::{validate, ApiContract};
use crate::api::{StatusClient, StatusSource};
use crate::config::{Config, REQUIRED_VARS};
use crate::notify::TelegramNotifier;

/// Run all checks, report each one, and fail if any check failed.
pub fn execute() -> Result<()> {
    println!("{}", "Vigil Doctor".bold().blue());
    println!("{}", "=".repeat(50));

    let mut issues = 0;

    println!("\n{}", "Environment".bold());
    let _ = dotenvy::dotenv();
    for var in REQUIRED_VARS {
        let present = env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if present {
            println!("  {} {var}", "✓".green());
        } else {
            println!("  {} {var} is not set", "✗".red());
            issues += 1;
        }
    }

    match Config::from_env() {
        Ok(config) => {
            issues += check_status_api(&config);
            issues += check_telegram(&config);
        }
        Err(_) => {
            println!("\nSkipping connectivity checks until the environment is complete.");
        }
    }

    println!();
    if issues > 0 {
        bail!("{issues} issue(s) found");
    }
    println!("{} All checks passed", "✓".green().bold());
    Ok(())
}

fn check_status_api(config: &Config) -> u32 {
    println!("\n{}", "Status API".bold());

    let client = match StatusClient::new(&config.endpoint, &config.practicum_token) {
        Ok(client) => client,
        Err(err) => {
            println!("  {} {err:#}", "✗".red());
            return 1;
        }
    };

    match client.fetch(Utc::now().timestamp()) {
        Ok(raw) => {
            println!("  {} endpoint reachable", "✓".green());
            match validate(&raw, ApiContract::V2) {
                Ok(batch) => {
                    println!(
                        "  {} response shape ok ({} item(s) in the current window)",
                        "✓".green(),
                        batch.homeworks.len()
                    );
                    0
                }
                Err(err) => {
                    println!("  {} {err}", "✗".red());
                    1
                }
            }
        }
        Err(err) => {
            println!("  {} {err}", "✗".red());
            1
        }
    }
}

fn check_telegram(config: &Config) -> u32 {
    println!("\n{}", "Telegram".bold());

    let notifier = match TelegramNotifier::new(&config.telegram_token, &config.telegram_chat_id) {
        Ok(notifier) => notifier,
        Err(err) => {
            println!("  {} {err:#}", "✗".red());
            return 1;
        }
    };

    match notifier.probe() {
        Ok(username) => {
            println!("  {} bot credential accepted (@{username})", "✓".green());
            0
        }
        Err(err) => {
            println!("  {} {err}", "✗".red());
            1
        }
    }
}
