use chrono::TimeDelta;
use reporting_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

// Fixed-length conversions used when a lookback is subtracted from a clock reading.
const MILLIS_PER_MONTH: i64 = 30 * MILLIS_PER_DAY;
const MILLIS_PER_YEAR: i64 = 365 * MILLIS_PER_DAY;

// Average Gregorian month length, used only for humanizing.
const DAYS_PER_400_YEARS: f64 = 146_097.0;
const MONTHS_PER_400_YEARS: f64 = 4_800.0;

/// Lookback window stored on a report definition (`core_params.time_duration`).
///
/// Accepts ISO-8601 durations (`PT1H`, `P7D`, `P1Y2M`) and the shorthand
/// `<n><unit>` form (`30m`, `1h`, `7d`, `2w`). The original text is kept so the
/// definition serializes back exactly as the backend stored it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LookbackDuration {
    source: String,
    months: i64,
    millis: i64,
}

impl LookbackDuration {
    /// Parses a lookback duration.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        let (months, millis) = if trimmed.starts_with('P') {
            parse_iso8601(trimmed)?
        } else {
            (0, parse_shorthand(trimmed)?)
        };

        if months == 0 && millis == 0 {
            return Err(AppError::Validation(format!(
                "lookback duration '{value}' must be greater than zero"
            )));
        }

        let duration = Self {
            source: trimmed.to_owned(),
            months,
            millis,
        };
        duration.total_millis().ok_or_else(|| {
            AppError::Validation(format!("lookback duration '{value}' is out of range"))
        })?;

        Ok(duration)
    }

    /// Returns the duration text as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the window length with months as 30 days and years as 365 days.
    #[must_use]
    pub fn to_time_delta(&self) -> TimeDelta {
        self.total_millis()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Renders an approximate natural-language span such as "an hour" or "2 days".
    ///
    /// The result is lossy: every unit is rounded and the largest unit that
    /// fits the thresholds wins, so `P1DT3H` reads "a day". Do not parse it
    /// back or treat it as a precise length.
    #[must_use]
    pub fn humanize(&self) -> String {
        let fixed_days = self.millis as f64 / MILLIS_PER_DAY as f64;
        let total_days =
            fixed_days + (self.months as f64 * DAYS_PER_400_YEARS / MONTHS_PER_400_YEARS).round();
        let total_months =
            self.months as f64 + fixed_days * MONTHS_PER_400_YEARS / DAYS_PER_400_YEARS;

        let seconds = (total_days * 86_400.0).round();
        let minutes = (total_days * 1_440.0).round();
        let hours = (total_days * 24.0).round();
        let days = total_days.round();
        let months = total_months.round();
        let years = (total_months / 12.0).round();

        if seconds <= 44.0 {
            "a few seconds".to_owned()
        } else if seconds < 45.0 {
            format!("{seconds} seconds")
        } else if minutes <= 1.0 {
            "a minute".to_owned()
        } else if minutes < 45.0 {
            format!("{minutes} minutes")
        } else if hours <= 1.0 {
            "an hour".to_owned()
        } else if hours < 22.0 {
            format!("{hours} hours")
        } else if days <= 1.0 {
            "a day".to_owned()
        } else if days < 26.0 {
            format!("{days} days")
        } else if months <= 1.0 {
            "a month".to_owned()
        } else if months < 11.0 {
            format!("{months} months")
        } else if years <= 1.0 {
            "a year".to_owned()
        } else {
            format!("{years} years")
        }
    }

    fn total_millis(&self) -> Option<i64> {
        let years = self.months / 12;
        let months = self.months % 12;
        years
            .checked_mul(MILLIS_PER_YEAR)?
            .checked_add(months.checked_mul(MILLIS_PER_MONTH)?)?
            .checked_add(self.millis)
    }
}

impl TryFrom<String> for LookbackDuration {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<LookbackDuration> for String {
    fn from(value: LookbackDuration) -> Self {
        value.source
    }
}

fn parse_iso8601(value: &str) -> AppResult<(i64, i64)> {
    let invalid = || AppError::Validation(format!("invalid ISO-8601 duration '{value}'"));

    let body = value.strip_prefix('P').ok_or_else(invalid)?;
    if body.is_empty() {
        return Err(invalid());
    }

    let mut months = 0_i64;
    let mut millis = 0_f64;
    let mut number = String::new();
    let mut in_time = false;
    let mut time_components = 0_usize;
    // Designators must appear in Y, M, W, D, H, M, S order.
    let mut last_rank = 0_u8;

    for character in body.chars() {
        if character.is_ascii_digit() || character == '.' || character == ',' {
            number.push(if character == ',' { '.' } else { character });
            continue;
        }

        if character == 'T' {
            if in_time || !number.is_empty() {
                return Err(invalid());
            }
            in_time = true;
            continue;
        }

        let rank = match (in_time, character) {
            (false, 'Y') => 1,
            (false, 'M') => 2,
            (false, 'W') => 3,
            (false, 'D') => 4,
            (true, 'H') => 5,
            (true, 'M') => 6,
            (true, 'S') => 7,
            _ => return Err(invalid()),
        };
        if rank <= last_rank || number.is_empty() {
            return Err(invalid());
        }
        last_rank = rank;

        let amount = number.parse::<f64>().map_err(|_| invalid())?;
        number.clear();
        if !amount.is_finite() {
            return Err(invalid());
        }

        match rank {
            1 | 2 => {
                if amount.fract() != 0.0 {
                    return Err(AppError::Validation(format!(
                        "duration '{value}' uses fractional years or months"
                    )));
                }
                let whole = amount as i64;
                let component = if rank == 1 {
                    whole.checked_mul(12).ok_or_else(invalid)?
                } else {
                    whole
                };
                months = months.checked_add(component).ok_or_else(invalid)?;
            }
            3 => millis += amount * MILLIS_PER_WEEK as f64,
            4 => millis += amount * MILLIS_PER_DAY as f64,
            5 => millis += amount * MILLIS_PER_HOUR as f64,
            6 => millis += amount * MILLIS_PER_MINUTE as f64,
            _ => millis += amount * MILLIS_PER_SECOND as f64,
        }

        if in_time {
            time_components += 1;
        }
    }

    if !number.is_empty() || (in_time && time_components == 0) {
        return Err(invalid());
    }
    if millis >= i64::MAX as f64 {
        return Err(invalid());
    }

    Ok((months, millis.round() as i64))
}

fn parse_shorthand(value: &str) -> AppResult<i64> {
    let invalid = || {
        AppError::Validation(format!(
            "invalid duration '{value}': expected ISO-8601 or <number><ms|s|m|h|d|w>"
        ))
    };

    let split_at = value
        .find(|character: char| !character.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (amount, unit) = value.split_at(split_at);
    let amount = amount.parse::<i64>().map_err(|_| invalid())?;
    let unit_millis = match unit {
        "ms" => 1,
        "s" => MILLIS_PER_SECOND,
        "m" => MILLIS_PER_MINUTE,
        "h" => MILLIS_PER_HOUR,
        "d" => MILLIS_PER_DAY,
        "w" => MILLIS_PER_WEEK,
        _ => return Err(invalid()),
    };

    amount.checked_mul(unit_millis).ok_or_else(invalid)
}
