use std::env;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{name} should be a positive integer, got {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} should be at most {max}, got {value}")]
    TooLarge { name: &'static str, value: i64, max: i64 },
}

/// The recent-participants window never reaches back past one day.
pub const MAX_RECENT_WINDOW_MINUTES: i64 = 24 * 60;
/// Sessions last at most a year.
pub const MAX_SESSION_TTL_HOURS: i64 = 365 * 24;

/// Process settings read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub pool_timeout: StdDuration,
    pub session_ttl_hours: i64,
    pub recent_window_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: number(&lookup, "PORT", 3000)?,
            pool_size: number(&lookup, "DATABASE_POOL_SIZE", 10)?,
            pool_timeout: StdDuration::from_secs(number(&lookup, "DATABASE_TIMEOUT_SECS", 5)?),
            session_ttl_hours: at_most(number(&lookup, "SESSION_TTL_HOURS", 24)?, "SESSION_TTL_HOURS", MAX_SESSION_TTL_HOURS)?,
            recent_window_minutes: at_most(
                number(&lookup, "RECENT_WINDOW_MINUTES", 10)?,
                "RECENT_WINDOW_MINUTES",
                MAX_RECENT_WINDOW_MINUTES,
            )?,
        })
    }

    pub fn context(&self) -> Context {
        Context {
            clock: Arc::new(SystemClock),
            recent_window: Duration::minutes(self.recent_window_minutes),
            session_ttl: Duration::hours(self.session_ttl_hours),
        }
    }
}

fn number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}

fn at_most(value: i64, name: &'static str, max: i64) -> Result<i64, ConfigError> {
    if value > max {
        return Err(ConfigError::TooLarge { name, value, max });
    }
    Ok(value)
}

/// Per-process state handed to every operation alongside a store handle.
#[derive(Clone)]
pub struct Context {
    pub clock: Arc<dyn Clock>,
    pub recent_window: Duration,
    pub session_ttl: Duration,
}
