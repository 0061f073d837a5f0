//! The record abstraction shared by every dashboard view.
//!
//! Each view persists one or more record types. A record is a plain
//! serde document tagged with a [`RecordKind`]; the store keeps it as JSON,
//! scoped to the owning user.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

/// Kinds of records held in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Matter,
    Leave,
    Meeting,
    Note,
    NetWorth,
    Project,
    WorkflowStep,
    WorkflowTask,
    GtciScore,
}

impl RecordKind {
    pub const ALL: [RecordKind; 9] = [
        RecordKind::Matter,
        RecordKind::Leave,
        RecordKind::Meeting,
        RecordKind::Note,
        RecordKind::NetWorth,
        RecordKind::Project,
        RecordKind::WorkflowStep,
        RecordKind::WorkflowTask,
        RecordKind::GtciScore,
    ];

    /// Stable name used in storage and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Matter => "matter",
            RecordKind::Leave => "leave",
            RecordKind::Meeting => "meeting",
            RecordKind::Note => "note",
            RecordKind::NetWorth => "net_worth",
            RecordKind::Project => "project",
            RecordKind::WorkflowStep => "workflow_step",
            RecordKind::WorkflowTask => "workflow_task",
            RecordKind::GtciScore => "gtci_score",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DeskError::InvalidInput(format!("Unknown record kind: {}", value)))
    }
}

/// A document that can be persisted in a store.
pub trait Record: Serialize + DeserializeOwned {
    /// Kind tag stored next to the document.
    const KIND: RecordKind;

    /// Check field-level rules before the record is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Text indexed for full-text search.
    fn search_text(&self) -> String;
}

/// Parse an enumeration value from user input, matching case-insensitively
/// against the serde names and the display labels.
pub(crate) fn parse_choice<T: Copy>(
    value: &str,
    choices: &[(T, &'static str, &'static str)],
    what: &str,
) -> Result<T> {
    let needle = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    choices
        .iter()
        .find(|(_, key, label)| {
            *key == needle || label.to_ascii_lowercase().replace([' ', '-'], "_") == needle
        })
        .map(|(choice, _, _)| *choice)
        .ok_or_else(|| {
            let names: Vec<&str> = choices.iter().map(|(_, key, _)| *key).collect();
            DeskError::InvalidInput(format!(
                "Unknown {}: {} (use one of: {})",
                what,
                value,
                names.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_accepts_dashes() {
        assert_eq!(
            "workflow-task".parse::<RecordKind>().unwrap(),
            RecordKind::WorkflowTask
        );
        assert!("invoice".parse::<RecordKind>().is_err());
    }
}
