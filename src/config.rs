use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use dotenvy::dotenv;

use crate::model::{WorklogScope, YearMonth};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    /// Period the binary rebuilds worklogs for.
    pub report_scope: WorklogScope,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let log_dir = lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string());
        let log_level = parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?;

        let month = match lookup("REPORT_MONTH") {
            Some(raw) => raw
                .parse::<YearMonth>()
                .with_context(|| format!("REPORT_MONTH is not YYYY-MM: {raw:?}"))?,
            None => YearMonth::of(Local::now().date_naive()),
        };
        let employee_id = lookup("REPORT_EMPLOYEE_ID")
            .map(|raw| {
                raw.parse::<i64>()
                    .with_context(|| format!("REPORT_EMPLOYEE_ID is not an id: {raw:?}"))
            })
            .transpose()?;
        let date = lookup("REPORT_DATE")
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("REPORT_DATE is not YYYY-MM-DD: {raw:?}"))
            })
            .transpose()?;

        let report_scope = match (date, employee_id) {
            (Some(date), _) => WorklogScope::Date(date),
            (None, Some(employee_id)) => WorklogScope::Employee { employee_id, month },
            (None, None) => WorklogScope::Month(month),
        };

        Ok(Self {
            database_url,
            max_connections,
            log_dir,
            log_level,
            report_scope,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
