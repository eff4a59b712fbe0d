use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dotenvy::dotenv;

use crate::leave::types::Days;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub leave: LeavePolicy,
}

/// Tunable leave rules
#[derive(Debug, Clone)]
pub struct LeavePolicy {
    pub annual_days: Days,
    pub annual_carry_over_cap: Days,
    pub custom_days: Days,
    /// Sick leave longer than this needs a medical certificate
    pub sick_certificate_after: Days,
    /// Attempts made on a lost optimistic write before reporting a conflict
    pub max_conflict_retries: u32,
    pub holidays: Vec<NaiveDate>,
    pub directory_cache_ttl: Duration,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            annual_days: Days::whole(12),
            annual_carry_over_cap: Days::whole(5),
            custom_days: Days::ZERO,
            sick_certificate_after: Days::whole(3),
            max_conflict_retries: 3,
            holidays: Vec::new(),
            directory_cache_ttl: Duration::from_secs(300),
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn days_or(key: &str, default: Days) -> Result<Days> {
    match env::var(key) {
        Ok(raw) => {
            let value: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a number of days: {raw}"))?;
            Days::try_from_f64(value).with_context(|| format!("{key} has an invalid value: {raw}"))
        }
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list of ISO dates
pub fn parse_holidays(raw: &str) -> Result<Vec<NaiveDate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid holiday date: {s}")))
        .collect()
}

impl LeavePolicy {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let holidays = match env::var("LEAVE_HOLIDAYS") {
            Ok(raw) => parse_holidays(&raw)?,
            Err(_) => defaults.holidays,
        };

        Ok(Self {
            annual_days: days_or("LEAVE_ANNUAL_DAYS", defaults.annual_days)?,
            annual_carry_over_cap: days_or("LEAVE_ANNUAL_CARRY_OVER_CAP", defaults.annual_carry_over_cap)?,
            custom_days: days_or("LEAVE_CUSTOM_DAYS", defaults.custom_days)?,
            sick_certificate_after: days_or("LEAVE_SICK_CERTIFICATE_AFTER_DAYS", defaults.sick_certificate_after)?,
            max_conflict_retries: parsed_or("LEAVE_MAX_CONFLICT_RETRIES", defaults.max_conflict_retries)?,
            holidays,
            directory_cache_ttl: Duration::from_secs(parsed_or(
                "DIRECTORY_CACHE_TTL_SECS",
                defaults.directory_cache_ttl.as_secs(),
            )?),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            leave: LeavePolicy::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_holidays() {
        let holidays = parse_holidays("2026-12-25, 2026-12-26,").unwrap();
        assert_eq!(
            holidays,
            vec![
                NaiveDate::from_ymd_opt(2026, 12, 25).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 26).unwrap(),
            ]
        );
        assert!(parse_holidays("25/12/2026").is_err());
    }

    #[test]
    fn test_default_policy() {
        let policy = LeavePolicy::default();
        assert_eq!(policy.annual_days, Days::whole(12));
        assert_eq!(policy.sick_certificate_after, Days::whole(3));
        assert_eq!(policy.max_conflict_retries, 3);
    }
}
