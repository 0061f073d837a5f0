//! Meetings and schedule queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::record::{Record, RecordKind};
use crate::validation::require_text;

/// Longest meeting accepted, one week.
pub const MAX_DURATION_MINUTES: u32 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub agenda: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

impl Meeting {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            title: title.into(),
            starts_at,
            duration_minutes,
            location: None,
            attendees: Vec::new(),
            agenda: None,
            cancelled: false,
        }
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Half-open interval intersection; cancelled meetings never overlap.
    pub fn overlaps(&self, other: &Meeting) -> bool {
        !self.cancelled
            && !other.cancelled
            && self.starts_at < other.ends_at()
            && other.starts_at < self.ends_at()
    }
}

impl Record for Meeting {
    const KIND: RecordKind = RecordKind::Meeting;

    fn validate(&self) -> Result<()> {
        require_text("Title", &self.title)?;
        if self.duration_minutes == 0 {
            return Err(DeskError::Validation(
                "Duration must be greater than zero".to_string(),
            ));
        }
        if self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(DeskError::Validation(format!(
                "Duration cannot exceed {} minutes",
                MAX_DURATION_MINUTES
            )));
        }
        if self.attendees.iter().any(|a| a.trim().is_empty()) {
            return Err(DeskError::Validation(
                "Attendee names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        parts.extend(self.location.clone());
        parts.extend(self.attendees.iter().cloned());
        parts.extend(self.agenda.clone());
        parts.join(" ")
    }
}

/// Meetings starting in `[now, now + window)`, excluding cancelled ones,
/// sorted by start time. A window reaching past the end of the calendar
/// has no upper bound.
pub fn upcoming<'a, T, F>(meetings: &'a [T], now: DateTime<Utc>, window: Duration, get: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &Meeting,
{
    let end = now.checked_add_signed(window);
    let mut found: Vec<&T> = meetings
        .iter()
        .filter(|item| {
            let meeting = get(item);
            !meeting.cancelled
                && meeting.starts_at >= now
                && end.map_or(true, |end| meeting.starts_at < end)
        })
        .collect();
    found.sort_by_key(|item| get(item).starts_at);
    found
}

/// Index pairs `(i, j)` with `i < j` of meetings that overlap.
pub fn conflicts<T, F>(meetings: &[T], get: F) -> Vec<(usize, usize)>
where
    F: Fn(&T) -> &Meeting,
{
    let mut order: Vec<usize> = (0..meetings.len()).collect();
    order.sort_by_key(|i| get(&meetings[*i]).starts_at);

    let mut pairs = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        let current = get(&meetings[i]);
        for &j in &order[pos + 1..] {
            let later = get(&meetings[j]);
            if later.starts_at >= current.ends_at() {
                break;
            }
            if current.overlaps(later) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn meeting(title: &str, start: &str, minutes: u32) -> Meeting {
        Meeting::new(title, at(start), minutes)
    }

    #[test]
    fn test_ends_at() {
        let m = meeting("Standup", "2025-03-10T09:00:00Z", 15);
        assert_eq!(m.ends_at(), at("2025-03-10T09:15:00Z"));
    }

    #[test]
    fn test_back_to_back_meetings_do_not_overlap() {
        let a = meeting("A", "2025-03-10T09:00:00Z", 30);
        let b = meeting("B", "2025-03-10T09:30:00Z", 30);
        let c = meeting("C", "2025-03-10T09:29:00Z", 5);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_cancelled_meeting_never_overlaps() {
        let a = meeting("A", "2025-03-10T09:00:00Z", 60);
        let mut b = meeting("B", "2025-03-10T09:15:00Z", 15);
        b.cancelled = true;
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_upcoming_window() {
        let mut cancelled = meeting("Cancelled", "2025-03-10T12:00:00Z", 30);
        cancelled.cancelled = true;
        let meetings = vec![
            meeting("Later", "2025-03-12T10:00:00Z", 30),
            meeting("Past", "2025-03-09T10:00:00Z", 30),
            meeting("Soon", "2025-03-10T10:00:00Z", 30),
            cancelled,
            meeting("Outside", "2025-03-20T10:00:00Z", 30),
        ];
        let found = upcoming(&meetings, at("2025-03-10T08:00:00Z"), Duration::days(7), |m| m);
        let titles: Vec<&str> = found.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Later"]);
    }

    #[test]
    fn test_upcoming_window_past_calendar_end_is_unbounded() {
        let meetings = vec![meeting("Far", "2090-01-01T10:00:00Z", 30)];
        let found = upcoming(
            &meetings,
            at("2025-03-10T08:00:00Z"),
            Duration::days(100_000_000),
            |m| m,
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_conflicts_report_pairs() {
        let meetings = vec![
            meeting("Long", "2025-03-10T09:00:00Z", 120),
            meeting("Free", "2025-03-10T13:00:00Z", 30),
            meeting("Inside", "2025-03-10T10:00:00Z", 30),
            meeting("Edge", "2025-03-10T11:00:00Z", 30),
        ];
        assert_eq!(conflicts(&meetings, |m| m), vec![(0, 2)]);
    }

    #[test]
    fn test_validate() {
        assert!(meeting("x", "2025-03-10T09:00:00Z", 0).validate().is_err());
        assert!(meeting(" ", "2025-03-10T09:00:00Z", 10).validate().is_err());
        let mut m = meeting("Sync", "2025-03-10T09:00:00Z", 10);
        m.attendees = vec!["ana".to_string(), "".to_string()];
        assert!(m.validate().is_err());
    }
}
