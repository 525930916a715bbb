use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use reporting_core::{AppError, AppResult};

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5601/api/reporting";
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 15;
const MAX_DISPLAY_OFFSET_MINUTES: i32 = 1439;

/// Runtime settings read from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub display_offset: FixedOffset,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let api_base_url = lookup("REPORTING_API_BASE_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let http_timeout_seconds = parse_var(
            &lookup,
            "REPORTING_HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;
        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "REPORTING_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let offset_minutes: i32 = parse_var(&lookup, "REPORTING_DISPLAY_UTC_OFFSET_MINUTES", 0)?;
        if offset_minutes.abs() > MAX_DISPLAY_OFFSET_MINUTES {
            return Err(AppError::Validation(format!(
                "REPORTING_DISPLAY_UTC_OFFSET_MINUTES must be within ±{MAX_DISPLAY_OFFSET_MINUTES}"
            )));
        }
        let display_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            AppError::Validation(format!(
                "REPORTING_DISPLAY_UTC_OFFSET_MINUTES value '{offset_minutes}' is out of range"
            ))
        })?;

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(http_timeout_seconds),
            display_offset,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
