//! SLA status derivation for matters.
//!
//! A matter's elapsed days-in-process are compared against the thresholds
//! configured for its current stage. Classification is a pure function of
//! the elapsed days, the completion flag and the thresholds, so identical
//! inputs always produce the same status.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::matter::{Matter, MatterStage};
use crate::record::parse_choice;

/// Day thresholds for one stage, measured in days since the matter opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThresholds {
    pub at_risk_days: u32,
    pub critical_days: u32,
    pub limit_days: u32,
}

impl StageThresholds {
    pub const fn new(at_risk_days: u32, critical_days: u32, limit_days: u32) -> Self {
        Self {
            at_risk_days,
            critical_days,
            limit_days,
        }
    }

    /// Thresholds must be non-decreasing: at risk <= critical <= limit.
    pub fn validate(&self) -> Result<()> {
        if self.at_risk_days > self.critical_days || self.critical_days > self.limit_days {
            return Err(DeskError::Validation(format!(
                "SLA thresholds must satisfy at_risk <= critical <= limit (got {}/{}/{})",
                self.at_risk_days, self.critical_days, self.limit_days
            )));
        }
        Ok(())
    }
}

/// Per-stage SLA configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Used for stages without an explicit entry
    pub default: StageThresholds,
    #[serde(default)]
    pub stages: BTreeMap<MatterStage, StageThresholds>,
}

impl Default for SlaConfig {
    fn default() -> Self {
        let stages = BTreeMap::from([
            (MatterStage::Intake, StageThresholds::new(5, 7, 10)),
            (MatterStage::Preparation, StageThresholds::new(14, 21, 30)),
            (MatterStage::Submitted, StageThresholds::new(30, 45, 60)),
            (MatterStage::UnderReview, StageThresholds::new(60, 75, 90)),
            (MatterStage::Decision, StageThresholds::new(75, 85, 100)),
        ]);
        Self {
            default: StageThresholds::new(30, 45, 60),
            stages,
        }
    }
}

impl SlaConfig {
    pub fn thresholds_for(&self, stage: MatterStage) -> StageThresholds {
        self.stages.get(&stage).copied().unwrap_or(self.default)
    }

    pub fn validate(&self) -> Result<()> {
        self.default.validate()?;
        for (stage, thresholds) in &self.stages {
            thresholds
                .validate()
                .map_err(|e| DeskError::Validation(format!("{} stage: {}", stage, e)))?;
        }
        Ok(())
    }
}

/// SLA status of a matter, ordered from least to most severe among open
/// statuses, followed by the completed outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    WithinSla,
    AtRisk,
    Critical,
    Overdue,
    Completed,
    CompletedOverdue,
}

impl SlaStatus {
    pub const ALL: [SlaStatus; 6] = [
        SlaStatus::WithinSla,
        SlaStatus::AtRisk,
        SlaStatus::Critical,
        SlaStatus::Overdue,
        SlaStatus::Completed,
        SlaStatus::CompletedOverdue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SlaStatus::WithinSla => "Within SLA",
            SlaStatus::AtRisk => "At Risk",
            SlaStatus::Critical => "Critical",
            SlaStatus::Overdue => "Overdue",
            SlaStatus::Completed => "Completed",
            SlaStatus::CompletedOverdue => "Completed Overdue",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, SlaStatus::Completed | SlaStatus::CompletedOverdue)
    }

    /// Open statuses that need attention.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            SlaStatus::AtRisk | SlaStatus::Critical | SlaStatus::Overdue
        )
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const STATUS_KEYS: [(SlaStatus, &str, &str); 6] = [
    (SlaStatus::WithinSla, "within_sla", "Within SLA"),
    (SlaStatus::AtRisk, "at_risk", "At Risk"),
    (SlaStatus::Critical, "critical", "Critical"),
    (SlaStatus::Overdue, "overdue", "Overdue"),
    (SlaStatus::Completed, "completed", "Completed"),
    (SlaStatus::CompletedOverdue, "completed_overdue", "Completed Overdue"),
];

impl FromStr for SlaStatus {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &STATUS_KEYS, "SLA status")
    }
}

/// Classify elapsed days against thresholds.
///
/// Open matters: beyond the limit is `Overdue`, at or past the critical
/// mark is `Critical`, at or past the at-risk mark is `AtRisk`. Completed
/// matters are `CompletedOverdue` when they finished beyond the limit.
pub fn classify(elapsed_days: i64, completed: bool, thresholds: &StageThresholds) -> SlaStatus {
    let elapsed = elapsed_days.max(0);
    let over_limit = elapsed > i64::from(thresholds.limit_days);

    if completed {
        return if over_limit {
            SlaStatus::CompletedOverdue
        } else {
            SlaStatus::Completed
        };
    }

    if over_limit {
        SlaStatus::Overdue
    } else if elapsed >= i64::from(thresholds.critical_days) {
        SlaStatus::Critical
    } else if elapsed >= i64::from(thresholds.at_risk_days) {
        SlaStatus::AtRisk
    } else {
        SlaStatus::WithinSla
    }
}

/// Result of evaluating one matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaEvaluation {
    pub status: SlaStatus,
    pub elapsed_days: i64,
    /// Days left before the limit; negative once exceeded
    pub days_remaining: i64,
    pub thresholds: StageThresholds,
}

/// Evaluate a matter's SLA as of `today`.
pub fn evaluate(matter: &Matter, config: &SlaConfig, today: NaiveDate) -> SlaEvaluation {
    let thresholds = config.thresholds_for(matter.stage);
    let elapsed_days = matter.day_counts(today).days_in_process;
    SlaEvaluation {
        status: classify(elapsed_days, matter.is_completed(), &thresholds),
        elapsed_days,
        days_remaining: i64::from(thresholds.limit_days) - elapsed_days,
        thresholds,
    }
}

/// Count evaluations by status. Every status is present, possibly with zero.
pub fn status_counts<'a, I>(evaluations: I) -> BTreeMap<SlaStatus, usize>
where
    I: IntoIterator<Item = &'a SlaEvaluation>,
{
    let mut counts: BTreeMap<SlaStatus, usize> =
        SlaStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for evaluation in evaluations {
        *counts.entry(evaluation.status).or_insert(0) += 1;
    }
    counts
}
