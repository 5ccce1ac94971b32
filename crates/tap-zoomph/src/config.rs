//! Tap configuration loaded from a JSON file

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;
use tap_zoomph_core::RetryPolicy;

use crate::api::DEFAULT_ENDPOINT;
use crate::workflow::PollSettings;

/// Wire format of both query bounds. No zone suffix.
const BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Configuration for one tap run. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub access_token: Option<String>,
    pub start_date: Option<String>,
    /// Accepted for compatibility; the end bound is always now + 1 day.
    pub end_date: Option<String>,
    pub partners: Option<Vec<Value>>,
    pub feed_id: Option<Value>,
    pub endpoint: String,
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    pub retry_interval_secs: u64,
    pub retry_jitter_ms: u64,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            access_token: None,
            start_date: None,
            end_date: None,
            partners: None,
            feed_id: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_attempts: retry.max_attempts,
            retry_interval_secs: retry.interval.as_secs(),
            retry_jitter_ms: u64::try_from(retry.max_jitter.as_millis()).unwrap_or(1000),
            poll_interval_secs: PollSettings::default().interval.as_secs(),
            max_poll_attempts: None,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                log::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn access_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .context("access_token is required")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            interval: Duration::from_secs(self.retry_interval_secs),
            max_jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_poll_attempts,
        }
    }

    /// Lower query bound: midnight of the `start_date` calendar day, or of
    /// today (UTC) when unset.
    pub fn start_bound(&self, now: DateTime<Utc>) -> Result<String> {
        let date = match self.start_date.as_deref() {
            Some(raw) => parse_date(raw)
                .with_context(|| format!("Invalid start_date: {raw}"))?,
            None => now.date_naive(),
        };
        Ok(format!("{}T00:00:00", date.format("%Y-%m-%d")))
    }
}

/// Upper query bound: `now` plus one day. The configured `end_date` is not used.
pub fn end_bound(now: DateTime<Utc>) -> String {
    (now + TimeDelta::days(1)).format(BOUND_FORMAT).to_string()
}

/// Naive date-time layouts accepted besides RFC 3339
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Calendar date of an ISO-8601 date-time (offset kept as given) or plain date
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").context("expected an ISO-8601 date or date-time")
}
