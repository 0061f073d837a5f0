//! Leave requests and yearly balances.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::record::{parse_choice, Record, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Sick,
    Compassionate,
    Unpaid,
    Other,
}

const TYPES: [(LeaveType, &str, &str); 5] = [
    (LeaveType::Annual, "annual", "Annual"),
    (LeaveType::Sick, "sick", "Sick"),
    (LeaveType::Compassionate, "compassionate", "Compassionate"),
    (LeaveType::Unpaid, "unpaid", "Unpaid"),
    (LeaveType::Other, "other", "Other"),
];

impl LeaveType {
    pub const ALL: [LeaveType; 5] = [
        LeaveType::Annual,
        LeaveType::Sick,
        LeaveType::Compassionate,
        LeaveType::Unpaid,
        LeaveType::Other,
    ];
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = TYPES
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for LeaveType {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &TYPES, "leave type")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

const STATUSES: [(LeaveStatus, &str, &str); 4] = [
    (LeaveStatus::Pending, "pending", "Pending"),
    (LeaveStatus::Approved, "approved", "Approved"),
    (LeaveStatus::Rejected, "rejected", "Rejected"),
    (LeaveStatus::Cancelled, "cancelled", "Cancelled"),
];

impl LeaveStatus {
    /// Pending and approved leave still occupies the calendar.
    pub fn is_active(&self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = STATUSES
            .iter()
            .find(|(status, _, _)| status == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for LeaveStatus {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &STATUSES, "leave status")
    }
}

/// A leave request covering an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    pub half_day: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Leave {
    pub fn new(leave_type: LeaveType, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            leave_type,
            start_date,
            end_date,
            status: LeaveStatus::Pending,
            half_day: false,
            reason: None,
        }
    }

    /// Weekdays in the range; a half day counts 0.5.
    pub fn working_days(&self) -> f64 {
        self.working_days_between(self.start_date, self.end_date)
    }

    /// Weekdays falling inside `year`.
    pub fn working_days_in_year(&self, year: i32) -> f64 {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return 0.0;
        };
        self.working_days_between(self.start_date.max(first), self.end_date.min(last))
    }

    fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        if end < start {
            return 0.0;
        }
        let weekdays = start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .count() as f64;
        if self.half_day {
            weekdays * 0.5
        } else {
            weekdays
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Active leave whose date ranges intersect.
    pub fn overlaps(&self, other: &Leave) -> bool {
        self.status.is_active()
            && other.status.is_active()
            && self.start_date <= other.end_date
            && other.start_date <= self.end_date
    }
}

impl Record for Leave {
    const KIND: RecordKind = RecordKind::Leave;

    fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(DeskError::Validation(format!(
                "End date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.half_day && self.start_date != self.end_date {
            return Err(DeskError::Validation(
                "A half day must start and end on the same date".to_string(),
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        let mut text = format!("{} leave {}", self.leave_type, self.status);
        if let Some(reason) = &self.reason {
            text.push(' ');
            text.push_str(reason);
        }
        text
    }
}

/// Balance for one leave type within a year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    /// Approved days
    pub taken: f64,
    pub pending: f64,
    pub allowance: Option<f64>,
    /// allowance - taken, when an allowance is configured
    pub remaining: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveSummary {
    pub year: i32,
    pub balances: Vec<LeaveBalance>,
}

impl LeaveSummary {
    pub fn for_year<'a, I>(leaves: I, year: i32, allowances: &BTreeMap<LeaveType, f64>) -> Self
    where
        I: IntoIterator<Item = &'a Leave>,
    {
        let mut taken: BTreeMap<LeaveType, f64> = BTreeMap::new();
        let mut pending: BTreeMap<LeaveType, f64> = BTreeMap::new();

        for leave in leaves {
            let days = leave.working_days_in_year(year);
            let bucket = match leave.status {
                LeaveStatus::Approved => &mut taken,
                LeaveStatus::Pending => &mut pending,
                LeaveStatus::Rejected | LeaveStatus::Cancelled => continue,
            };
            *bucket.entry(leave.leave_type).or_insert(0.0) += days;
        }

        let balances = LeaveType::ALL
            .iter()
            .map(|kind| {
                let taken = taken.get(kind).copied().unwrap_or(0.0);
                let allowance = allowances.get(kind).copied();
                LeaveBalance {
                    leave_type: *kind,
                    taken,
                    pending: pending.get(kind).copied().unwrap_or(0.0),
                    allowance,
                    remaining: allowance.map(|total| total - taken),
                }
            })
            .collect();

        Self { year, balances }
    }

    pub fn balance(&self, leave_type: LeaveType) -> Option<&LeaveBalance> {
        self.balances.iter().find(|b| b.leave_type == leave_type)
    }

    pub fn total_taken(&self) -> f64 {
        self.balances.iter().map(|b| b.taken).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn approved(kind: LeaveType, start: &str, end: &str) -> Leave {
        let mut leave = Leave::new(kind, date(start), date(end));
        leave.status = LeaveStatus::Approved;
        leave
    }

    #[test]
    fn test_working_days_skip_weekends() {
        // Friday 2025-03-07 to Tuesday 2025-03-11
        let leave = Leave::new(LeaveType::Annual, date("2025-03-07"), date("2025-03-11"));
        assert_eq!(leave.working_days(), 3.0);
    }

    #[test]
    fn test_half_day_counts_half() {
        let mut leave = Leave::new(LeaveType::Sick, date("2025-03-10"), date("2025-03-10"));
        leave.half_day = true;
        assert_eq!(leave.working_days(), 0.5);
        assert!(leave.validate().is_ok());

        leave.end_date = date("2025-03-11");
        assert!(leave.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_reversed_range() {
        let leave = Leave::new(LeaveType::Annual, date("2025-03-10"), date("2025-03-09"));
        assert!(matches!(leave.validate(), Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_working_days_in_year_clips_range() {
        // Mon 2024-12-30 .. Fri 2025-01-03
        let leave = Leave::new(LeaveType::Annual, date("2024-12-30"), date("2025-01-03"));
        assert_eq!(leave.working_days_in_year(2024), 2.0);
        assert_eq!(leave.working_days_in_year(2025), 3.0);
        assert_eq!(leave.working_days_in_year(2023), 0.0);
    }

    #[test]
    fn test_overlap_requires_active_status() {
        let a = approved(LeaveType::Annual, "2025-05-01", "2025-05-05");
        let mut b = Leave::new(LeaveType::Sick, date("2025-05-05"), date("2025-05-06"));
        assert!(a.overlaps(&b));

        b.status = LeaveStatus::Cancelled;
        assert!(!a.overlaps(&b));

        let c = approved(LeaveType::Annual, "2025-05-06", "2025-05-07");
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_summary_for_year() {
        let mut pending = Leave::new(LeaveType::Annual, date("2025-06-02"), date("2025-06-03"));
        pending.status = LeaveStatus::Pending;
        let mut rejected = approved(LeaveType::Annual, "2025-07-01", "2025-07-01");
        rejected.status = LeaveStatus::Rejected;
        let leaves = vec![
            approved(LeaveType::Annual, "2025-03-10", "2025-03-14"),
            approved(LeaveType::Sick, "2025-04-01", "2025-04-01"),
            pending,
            rejected,
        ];
        let allowances = BTreeMap::from([(LeaveType::Annual, 20.0)]);

        let summary = LeaveSummary::for_year(&leaves, 2025, &allowances);
        let annual = summary.balance(LeaveType::Annual).unwrap();
        assert_eq!(annual.taken, 5.0);
        assert_eq!(annual.pending, 2.0);
        assert_eq!(annual.remaining, Some(15.0));

        let sick = summary.balance(LeaveType::Sick).unwrap();
        assert_eq!(sick.taken, 1.0);
        assert_eq!(sick.remaining, None);
        assert_eq!(summary.total_taken(), 6.0);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("APPROVED".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert!("maybe".parse::<LeaveStatus>().is_err());
    }
}
