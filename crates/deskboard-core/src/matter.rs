//! Matters (cases) and their derived day counts.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::record::{parse_choice, Record, RecordKind};
use crate::validation::require_text;

/// Processing stage of a matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterStage {
    Intake,
    Preparation,
    Submitted,
    UnderReview,
    Decision,
}

const STAGES: [(MatterStage, &str, &str); 5] = [
    (MatterStage::Intake, "intake", "Intake"),
    (MatterStage::Preparation, "preparation", "Preparation"),
    (MatterStage::Submitted, "submitted", "Submitted"),
    (MatterStage::UnderReview, "under_review", "Under Review"),
    (MatterStage::Decision, "decision", "Decision"),
];

impl MatterStage {
    pub const ALL: [MatterStage; 5] = [
        MatterStage::Intake,
        MatterStage::Preparation,
        MatterStage::Submitted,
        MatterStage::UnderReview,
        MatterStage::Decision,
    ];

    pub fn label(&self) -> &'static str {
        STAGES
            .iter()
            .find(|(stage, _, _)| stage == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown")
    }

    pub fn key(&self) -> &'static str {
        STAGES
            .iter()
            .find(|(stage, _, _)| stage == self)
            .map(|(_, key, _)| *key)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for MatterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatterStage {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &STAGES, "stage")
    }
}

/// Priority of a matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

const PRIORITIES: [(Priority, &str, &str); 4] = [
    (Priority::Low, "low", "Low"),
    (Priority::Normal, "normal", "Normal"),
    (Priority::High, "high", "High"),
    (Priority::Urgent, "urgent", "Urgent"),
];

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = PRIORITIES
            .iter()
            .find(|(priority, _, _)| priority == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for Priority {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &PRIORITIES, "priority")
    }
}

/// A tracked matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    /// External reference, e.g. a file number
    pub reference: String,
    pub client: String,
    #[serde(default)]
    pub category: String,
    pub stage: MatterStage,
    #[serde(default)]
    pub priority: Priority,
    pub opened_on: NaiveDate,
    #[serde(default)]
    pub stage_entered_on: Option<NaiveDate>,
    #[serde(default)]
    pub submitted_on: Option<NaiveDate>,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Day counts derived from a matter's dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatterDays {
    /// Days from opening to completion, or to today while open
    pub days_in_process: i64,
    /// Days in the current stage
    pub days_in_stage: i64,
    /// Days since submission, when submitted
    pub days_since_submission: Option<i64>,
}

impl Matter {
    pub fn new(
        reference: impl Into<String>,
        client: impl Into<String>,
        stage: MatterStage,
        opened_on: NaiveDate,
    ) -> Self {
        Self {
            reference: reference.into(),
            client: client.into(),
            category: String::new(),
            stage,
            priority: Priority::Normal,
            opened_on,
            stage_entered_on: None,
            submitted_on: None,
            completed_on: None,
            assignee: None,
            notes: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_on.is_some()
    }

    /// Move to a new stage, recording the date it was entered.
    pub fn advance_to(&mut self, stage: MatterStage, on: NaiveDate) {
        if stage != self.stage {
            self.stage = stage;
            self.stage_entered_on = Some(on);
        }
        if stage == MatterStage::Submitted && self.submitted_on.is_none() {
            self.submitted_on = Some(on);
        }
    }

    /// The date day counts run up to: completion, or `today` while open.
    pub fn end_date(&self, today: NaiveDate) -> NaiveDate {
        self.completed_on.unwrap_or(today)
    }

    /// Derive day counts as of `today`. Negative spans clamp to zero.
    pub fn day_counts(&self, today: NaiveDate) -> MatterDays {
        let end = self.end_date(today);
        let stage_start = self.stage_entered_on.unwrap_or(self.opened_on);
        MatterDays {
            days_in_process: days_between(self.opened_on, end),
            days_in_stage: days_between(stage_start, end),
            days_since_submission: self.submitted_on.map(|date| days_between(date, end)),
        }
    }
}

fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(0)
}

impl Record for Matter {
    const KIND: RecordKind = RecordKind::Matter;

    fn validate(&self) -> Result<()> {
        require_text("Reference", &self.reference)?;
        require_text("Client", &self.client)?;
        for (field, date) in [
            ("Stage entry date", self.stage_entered_on),
            ("Submission date", self.submitted_on),
            ("Completion date", self.completed_on),
        ] {
            if let Some(date) = date {
                if date < self.opened_on {
                    return Err(DeskError::Validation(format!(
                        "{} {} is before the opening date {}",
                        field, date, self.opened_on
                    )));
                }
            }
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        let mut parts = vec![
            self.reference.clone(),
            self.client.clone(),
            self.category.clone(),
            self.stage.label().to_string(),
        ];
        parts.extend(self.assignee.clone());
        parts.extend(self.notes.clone());
        parts.join(" ")
    }
}
