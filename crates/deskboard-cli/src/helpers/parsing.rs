//! Parsing helpers for dates, times, durations and amounts.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use deskboard_core::money::Money;

use crate::errors::CliError;

fn invalid(message: String) -> anyhow::Error {
    CliError::invalid_input(message).into()
}

/// Parse a calendar date: `YYYY-MM-DD`, `today`, `yesterday` or `tomorrow`.
pub fn parse_date(value: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match value.trim().to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => {
            return today
                .pred_opt()
                .ok_or_else(|| invalid(format!("No day before {}", today)))
        }
        "tomorrow" => {
            return today
                .succ_opt()
                .ok_or_else(|| invalid(format!("No day after {}", today)))
        }
        _ => {}
    }
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(format!("Invalid date (expected YYYY-MM-DD): {}", value)))
}

/// Parse an optional date flag.
pub fn parse_optional_date(
    value: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<Option<NaiveDate>> {
    value.map(|v| parse_date(v, today)).transpose()
}

/// Parse a point in time.
///
/// RFC 3339 values carry their own offset. `YYYY-MM-DD HH:MM` and
/// `YYYY-MM-DDTHH:MM` are read as wall-clock time in `tz`.
pub fn parse_datetime(value: &str, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            invalid(format!(
                "Invalid date/time (expected RFC 3339 or \"YYYY-MM-DD HH:MM\"): {}",
                value
            ))
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Clocks went back: take the first occurrence
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(invalid(format!(
            "{} does not exist in {} (daylight saving gap)",
            value,
            tz.name()
        ))),
    }
}

/// Parse a meeting length into minutes: `45`, `45m`, `2h` or `1h30m`.
pub fn parse_minutes(value: &str) -> anyhow::Result<u32> {
    let bad = || invalid(format!("Invalid duration: {} (use e.g. 45m, 2h, 1h30m)", value));
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(bad());
    }
    if let Ok(minutes) = trimmed.parse::<u32>() {
        return Ok(minutes);
    }

    let mut total: u32 = 0;
    let mut digits = String::new();
    for ch in trimmed.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            'h' | 'm' if !digits.is_empty() => {
                let amount: u32 = digits.parse().map_err(|_| bad())?;
                let minutes = if ch == 'h' {
                    amount.checked_mul(60).ok_or_else(bad)?
                } else {
                    amount
                };
                total = total.checked_add(minutes).ok_or_else(bad)?;
                digits.clear();
            }
            _ => return Err(bad()),
        }
    }
    if !digits.is_empty() {
        return Err(bad());
    }
    Ok(total)
}

/// Longest look-ahead window, ten years.
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// Parse a look-ahead window such as `7d` or `2w` into days.
pub fn parse_window_days(value: &str) -> anyhow::Result<i64> {
    let bad = || invalid(format!("Invalid window: {} (expected <number><d|w>)", value));
    let trimmed = value.trim();
    if trimmed.len() < 2 {
        return Err(bad());
    }
    let (number, unit) = trimmed.split_at(trimmed.len() - 1);
    let amount: i64 = number.parse().map_err(|_| bad())?;
    if amount <= 0 {
        return Err(invalid(format!("Window must be positive: {}", value)));
    }
    let days = match unit {
        "d" => amount,
        "w" => amount.checked_mul(7).ok_or_else(bad)?,
        _ => return Err(bad()),
    };
    if days > MAX_WINDOW_DAYS {
        return Err(invalid(format!(
            "Window too long: {} (max {} days)",
            value, MAX_WINDOW_DAYS
        )));
    }
    Ok(days)
}

/// Parse a money amount such as `1,250.00`.
pub fn parse_money(value: &str) -> anyhow::Result<Money> {
    value
        .parse::<Money>()
        .map_err(|e| invalid(e.to_string()))
}

/// Parse a value through its `FromStr` impl, mapping failures to invalid input.
pub fn parse_choice<T>(value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = date("2025-03-10");
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Yesterday", today).unwrap(), date("2025-03-09"));
        assert_eq!(parse_date("tomorrow", today).unwrap(), date("2025-03-11"));
        assert_eq!(parse_date("2024-02-29", today).unwrap(), date("2024-02-29"));
        assert!(parse_date("2025-02-30", today).is_err());
        assert!(parse_date("10/03/2025", today).is_err());
    }

    #[test]
    fn test_parse_date_keywords_at_calendar_edges() {
        let err = parse_date("yesterday", NaiveDate::MIN).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
        let err = parse_date("tomorrow", NaiveDate::MAX).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_parse_datetime_in_timezone() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let parsed = parse_datetime("2025-01-15 09:30", tz).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-15T14:30:00+00:00");

        let explicit = parse_datetime("2025-01-15T09:30:00+01:00", tz).unwrap();
        assert_eq!(explicit.to_rfc3339(), "2025-01-15T08:30:00+00:00");
    }

    #[test]
    fn test_parse_datetime_rejects_dst_gap() {
        let tz: Tz = "America/New_York".parse().unwrap();
        assert!(parse_datetime("2025-03-09 02:30", tz).is_err());
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("45").unwrap(), 45);
        assert_eq!(parse_minutes("45m").unwrap(), 45);
        assert_eq!(parse_minutes("2h").unwrap(), 120);
        assert_eq!(parse_minutes("1h30m").unwrap(), 90);
        assert!(parse_minutes("").is_err());
        assert!(parse_minutes("h").is_err());
        assert!(parse_minutes("1d").is_err());
        assert!(parse_minutes("90s").is_err());
    }

    #[test]
    fn test_parse_window_days() {
        assert_eq!(parse_window_days("7d").unwrap(), 7);
        assert_eq!(parse_window_days("2w").unwrap(), 14);
        assert!(parse_window_days("0d").is_err());
        assert!(parse_window_days("3x").is_err());
    }

    #[test]
    fn test_parse_window_days_rejects_huge_windows() {
        assert_eq!(parse_window_days("3660d").unwrap(), MAX_WINDOW_DAYS);
        for value in ["1000000000d", "3661d", "9223372036854775807w"] {
            let err = parse_window_days(value).unwrap_err();
            assert!(err.downcast_ref::<CliError>().is_some(), "{}", value);
        }
    }

    #[test]
    fn test_parse_money_maps_to_invalid_input() {
        assert_eq!(parse_money("1,250.50").unwrap(), Money::from_cents(125_050));
        let err = parse_money("12.345").unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
