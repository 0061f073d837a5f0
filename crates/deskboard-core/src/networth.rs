//! Net-worth entries and "latest wins" aggregation.
//!
//! Entries are dated balances keyed by type and label. A summary keeps only
//! the most recent entry for each key and sums the survivors by type.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::money::Money;
use crate::record::{parse_choice, Record, RecordKind};
use crate::storage::Stored;
use crate::validation::require_text;

/// Kind of balance an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetWorthType {
    Asset,
    Loan,
    Saving,
}

const TYPES: [(NetWorthType, &str, &str); 3] = [
    (NetWorthType::Asset, "asset", "Asset"),
    (NetWorthType::Loan, "loan", "Loan"),
    (NetWorthType::Saving, "saving", "Saving"),
];

impl fmt::Display for NetWorthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = TYPES
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for NetWorthType {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        // plural forms are common in user input
        let value = value.trim();
        let singular = value.strip_suffix(['s', 'S']).unwrap_or(value);
        parse_choice(value, &TYPES, "entry type")
            .or_else(|_| parse_choice(singular, &TYPES, "entry type"))
    }
}

/// A dated balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetWorthEntry {
    pub entry_type: NetWorthType,
    pub label: String,
    pub amount: Money,
    pub logged_on: NaiveDate,
}

impl NetWorthEntry {
    pub fn new(
        entry_type: NetWorthType,
        label: impl Into<String>,
        amount: Money,
        logged_on: NaiveDate,
    ) -> Self {
        Self {
            entry_type,
            label: label.into(),
            amount,
            logged_on,
        }
    }

    /// Grouping key: type plus trimmed, case-folded label.
    pub fn key(&self) -> (NetWorthType, String) {
        (self.entry_type, normalize_label(&self.label))
    }
}

pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

impl Record for NetWorthEntry {
    const KIND: RecordKind = RecordKind::NetWorth;

    fn validate(&self) -> Result<()> {
        require_text("Label", &self.label)?;
        if self.amount.is_negative() {
            return Err(DeskError::Validation(
                "Amount cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.entry_type, self.label)
    }
}

/// Recency order: log date, then creation time, then id.
fn recency(a: &Stored<NetWorthEntry>, b: &Stored<NetWorthEntry>) -> Ordering {
    a.record
        .logged_on
        .cmp(&b.record.logged_on)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Keep the most recent entry per (type, label).
///
/// Entries logged after `as_of` are ignored. The result is sorted by type,
/// then label.
pub fn latest_entries<'a>(
    entries: &'a [Stored<NetWorthEntry>],
    as_of: Option<NaiveDate>,
) -> Vec<&'a Stored<NetWorthEntry>> {
    let mut latest: HashMap<(NetWorthType, String), &Stored<NetWorthEntry>> = HashMap::new();

    for entry in entries {
        if as_of.is_some_and(|cutoff| entry.record.logged_on > cutoff) {
            continue;
        }
        latest
            .entry(entry.record.key())
            .and_modify(|current| {
                if recency(entry, current) == Ordering::Greater {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }

    let mut kept: Vec<_> = latest.into_values().collect();
    kept.sort_by(|a, b| a.record.key().cmp(&b.record.key()));
    kept
}

/// One line of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub id: uuid::Uuid,
    pub entry_type: NetWorthType,
    pub label: String,
    pub amount: Money,
    pub logged_on: NaiveDate,
}

/// Totals after "latest wins" selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetWorthSummary {
    pub as_of: Option<NaiveDate>,
    pub assets: Money,
    pub loans: Money,
    pub savings: Money,
    /// assets + savings - loans
    pub net: Money,
    pub entries: Vec<SummaryLine>,
}

impl NetWorthSummary {
    pub fn total(&self, entry_type: NetWorthType) -> Money {
        match entry_type {
            NetWorthType::Asset => self.assets,
            NetWorthType::Loan => self.loans,
            NetWorthType::Saving => self.savings,
        }
    }
}

pub fn summarize(entries: &[Stored<NetWorthEntry>], as_of: Option<NaiveDate>) -> NetWorthSummary {
    let kept = latest_entries(entries, as_of);

    let total_for = |kind: NetWorthType| -> Money {
        kept.iter()
            .filter(|e| e.record.entry_type == kind)
            .map(|e| e.record.amount)
            .sum()
    };
    let assets = total_for(NetWorthType::Asset);
    let loans = total_for(NetWorthType::Loan);
    let savings = total_for(NetWorthType::Saving);

    NetWorthSummary {
        as_of,
        assets,
        loans,
        savings,
        net: assets + savings - loans,
        entries: kept
            .into_iter()
            .map(|e| SummaryLine {
                id: e.id,
                entry_type: e.record.entry_type,
                label: e.record.label.trim().to_string(),
                amount: e.record.amount,
                logged_on: e.record.logged_on,
            })
            .collect(),
    }
}

/// Summaries at each date, for trend views.
pub fn history(entries: &[Stored<NetWorthEntry>], dates: &[NaiveDate]) -> Vec<NetWorthSummary> {
    dates
        .iter()
        .map(|date| summarize(entries, Some(*date)))
        .collect()
}

/// Month-end dates covering `months` months back from `end`, oldest first.
pub fn month_ends(end: NaiveDate, months: u32) -> Vec<NaiveDate> {
    use chrono::{Datelike, Months};

    let mut dates = Vec::with_capacity(months as usize);
    for back in (0..months).rev() {
        let Some(month) = end.checked_sub_months(Months::new(back)) else {
            continue;
        };
        let first = NaiveDate::from_ymd_opt(month.year(), month.month(), 1);
        let last = first
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .and_then(|d| d.pred_opt());
        if let Some(last) = last {
            dates.push(last.min(end));
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn stored(
        kind: NetWorthType,
        label: &str,
        cents: i64,
        logged_on: &str,
        created_offset_secs: i64,
    ) -> Stored<NetWorthEntry> {
        let created = base_time() + Duration::seconds(created_offset_secs);
        Stored {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            created_at: created,
            updated_at: created,
            record: NetWorthEntry::new(kind, label, Money::from_cents(cents), date(logged_on)),
        }
    }

    #[test]
    fn test_latest_log_date_wins() {
        let entries = vec![
            stored(NetWorthType::Asset, "House", 100_000, "2025-01-01", 50),
            stored(NetWorthType::Asset, "House", 120_000, "2025-02-01", 10),
        ];
        let summary = summarize(&entries, None);
        assert_eq!(summary.assets, Money::from_cents(120_000));
        assert_eq!(summary.entries.len(), 1);
    }

    #[test]
    fn test_same_day_tie_goes_to_later_creation() {
        let entries = vec![
            stored(NetWorthType::Saving, "Emergency", 900, "2025-03-01", 20),
            stored(NetWorthType::Saving, "Emergency", 500, "2025-03-01", 10),
        ];
        assert_eq!(summarize(&entries, None).savings, Money::from_cents(900));
    }

    #[test]
    fn test_labels_group_case_insensitively() {
        let entries = vec![
            stored(NetWorthType::Loan, "Car Loan", 5_000, "2025-01-01", 0),
            stored(NetWorthType::Loan, " car loan ", 4_000, "2025-02-01", 0),
            stored(NetWorthType::Asset, "Car Loan", 7_000, "2025-01-01", 0),
        ];
        let summary = summarize(&entries, None);
        assert_eq!(summary.loans, Money::from_cents(4_000));
        assert_eq!(summary.assets, Money::from_cents(7_000));
        assert_eq!(summary.entries.len(), 2);
    }

    #[test]
    fn test_net_formula_may_go_negative() {
        let entries = vec![
            stored(NetWorthType::Asset, "Cash", 1_000, "2025-01-01", 0),
            stored(NetWorthType::Saving, "Pension", 2_000, "2025-01-01", 0),
            stored(NetWorthType::Loan, "Mortgage", 10_000, "2025-01-01", 0),
        ];
        let summary = summarize(&entries, None);
        assert_eq!(summary.net, Money::from_cents(1_000 + 2_000 - 10_000));
        assert!(summary.net.is_negative());
    }

    #[test]
    fn test_as_of_ignores_future_entries() {
        let entries = vec![
            stored(NetWorthType::Asset, "Stocks", 1_000, "2025-01-15", 0),
            stored(NetWorthType::Asset, "Stocks", 3_000, "2025-03-15", 0),
        ];
        let summary = summarize(&entries, Some(date("2025-02-28")));
        assert_eq!(summary.assets, Money::from_cents(1_000));

        let points = history(&entries, &[date("2024-12-31"), date("2025-12-31")]);
        assert_eq!(points[0].assets, Money::ZERO);
        assert_eq!(points[1].assets, Money::from_cents(3_000));
    }

    #[test]
    fn test_exactly_one_entry_per_key() {
        let mut entries = Vec::new();
        for i in 0..20 {
            let label = if i % 2 == 0 { "A" } else { "b" };
            entries.push(stored(NetWorthType::Asset, label, i, "2025-01-01", i % 3));
        }
        let kept = latest_entries(&entries, None);
        assert_eq!(kept.len(), 2);
        for winner in kept {
            let rivals = entries.iter().filter(|e| e.record.key() == winner.record.key());
            for rival in rivals {
                assert_ne!(recency(rival, winner), Ordering::Greater);
            }
        }
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let entry = NetWorthEntry::new(
            NetWorthType::Asset,
            "Cash",
            Money::from_cents(-1),
            date("2025-01-01"),
        );
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_type_parses_plural() {
        assert_eq!("assets".parse::<NetWorthType>().unwrap(), NetWorthType::Asset);
        assert_eq!("Loan".parse::<NetWorthType>().unwrap(), NetWorthType::Loan);
        assert!("bonds".parse::<NetWorthType>().is_err());
    }

    #[test]
    fn test_month_ends() {
        let dates = month_ends(date("2025-03-10"), 3);
        assert_eq!(
            dates,
            vec![date("2025-01-31"), date("2025-02-28"), date("2025-03-10")]
        );
    }
}
