//! String formatting utilities for UI rendering.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// Wrap text to a given width, preserving newlines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    lines
}

/// Format a short ID from a UUID (first 8 characters).
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format a timestamp in the configured timezone.
///
/// Plain output keeps RFC 3339 in UTC so scripts see a stable value.
pub fn format_datetime(dt: &DateTime<Utc>, tz: Tz, pretty: bool) -> String {
    if pretty {
        dt.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string()
    } else {
        dt.to_rfc3339()
    }
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format an optional date, using `-` when absent.
pub fn format_optional_date(date: Option<&NaiveDate>) -> String {
    date.map(format_date).unwrap_or_else(|| "-".to_string())
}

/// Format a day count that may include a half day.
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{:.0}", days)
    } else {
        format!("{:.1}", days)
    }
}

/// Format a signed change, e.g. `+2` or `-1.4`.
pub fn format_change(value: f64, decimals: usize) -> String {
    if value > 0.0 {
        format!("+{:.*}", decimals, value)
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Sanitize a string for single-line output (replace newlines with spaces).
pub fn single_line(s: &str) -> String {
    s.replace('\n', " ").replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 2), "he");
    }

    #[test]
    fn test_wrap_simple() {
        let lines = wrap("hello world foo bar", 10);
        assert_eq!(lines, vec!["hello", "world foo", "bar"]);
    }

    #[test]
    fn test_wrap_preserves_newlines() {
        let lines = wrap("hello\n\nworld", 20);
        assert_eq!(lines, vec!["hello", "", "world"]);
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::parse_str("7a2e3c0b-1234-5678-9abc-def012345678").unwrap();
        assert_eq!(short_id(&id), "7a2e3c0b");
    }

    #[test]
    fn test_format_datetime_uses_timezone_when_pretty() {
        let dt = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let tz: Tz = "Europe/London".parse().unwrap();
        assert_eq!(format_datetime(&dt, tz, true), "2025-06-01 13:00 BST");
        assert_eq!(format_datetime(&dt, tz, false), "2025-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(3.0), "3");
        assert_eq!(format_days(0.5), "0.5");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(2.0, 0), "+2");
        assert_eq!(format_change(-1.44, 1), "-1.4");
        assert_eq!(format_change(0.0, 1), "0.0");
    }

    #[test]
    fn test_format_optional_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(format_optional_date(Some(&date)), "2025-01-02");
        assert_eq!(format_optional_date(None), "-");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("hello\nworld"), "hello world");
    }
}
