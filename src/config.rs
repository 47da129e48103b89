// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub const DB_ENV: &str = "COSTCLIP_DB";
pub const LOG_ENV: &str = "COSTCLIP_LOG";

pub const CURRENCY_KEY: &str = "currency";
pub const CACHE_DAYS_KEY: &str = "cache_days";

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_CACHE_DAYS: i64 = 30;
pub const MAX_CACHE_DAYS: i64 = 3650;

/// Process-level configuration, resolved once in `main` and passed down.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        let db_path = env::var(DB_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        match &db_path {
            Some(p) => debug!("{DB_ENV} set, using database at {}", p.display()),
            None => debug!("{DB_ENV} not set, using platform data dir"),
        }
        Self { db_path }
    }
}

pub fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    match env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            eprintln!("Invalid {LOG_ENV} value '{directives}': {e}");
            EnvFilter::new("warn")
        }),
        Err(_) => EnvFilter::new("warn"),
    }
}

pub fn default_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, CURRENCY_KEY)?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn cache_days(conn: &Connection) -> Result<i64> {
    let Some(raw) = get_setting(conn, CACHE_DAYS_KEY)? else {
        return Ok(DEFAULT_CACHE_DAYS);
    };
    match raw.parse::<i64>() {
        Ok(days) if (0..=MAX_CACHE_DAYS).contains(&days) => Ok(days),
        _ => {
            warn!("Invalid {CACHE_DAYS_KEY} setting '{raw}', using default: {DEFAULT_CACHE_DAYS}");
            Ok(DEFAULT_CACHE_DAYS)
        }
    }
}

/// Validate and persist one setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    let stored = match key.trim() {
        CURRENCY_KEY => {
            if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(anyhow!("Invalid currency '{}', expected a 3-letter code", value));
            }
            value.to_uppercase()
        }
        CACHE_DAYS_KEY => {
            let days: i64 = value
                .parse()
                .map_err(|_| anyhow!("Invalid {} '{}', expected whole days", CACHE_DAYS_KEY, value))?;
            if days < 0 {
                return Err(anyhow!("{} must not be negative", CACHE_DAYS_KEY));
            }
            if days > MAX_CACHE_DAYS {
                return Err(anyhow!(
                    "{} must be at most {} days",
                    CACHE_DAYS_KEY,
                    MAX_CACHE_DAYS
                ));
            }
            days.to_string()
        }
        other => {
            return Err(anyhow!(
                "Unknown setting '{}' (use {}|{})",
                other,
                CURRENCY_KEY,
                CACHE_DAYS_KEY
            ));
        }
    };
    set_setting(conn, key.trim(), &stored)?;
    Ok(stored)
}
