//! Workflow board: ordered steps with tasks moving through them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::record::{Record, RecordKind};
use crate::storage::Stored;
use crate::validation::require_text;

/// A column on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for WorkflowStep {
    const KIND: RecordKind = RecordKind::WorkflowStep;

    fn validate(&self) -> Result<()> {
        require_text("Step name", &self.name)
    }

    fn search_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.name, description),
            None => self.name.clone(),
        }
    }
}

/// A card placed in a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Id of the owning [`WorkflowStep`] record
    pub step_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
}

impl Record for WorkflowTask {
    const KIND: RecordKind = RecordKind::WorkflowTask;

    fn validate(&self) -> Result<()> {
        require_text("Task title", &self.title)
    }

    fn search_text(&self) -> String {
        match &self.assignee {
            Some(assignee) => format!("{} {}", self.title, assignee),
            None => self.title.clone(),
        }
    }
}

fn step_order(steps: &[Stored<WorkflowStep>]) -> Vec<&Stored<WorkflowStep>> {
    let mut ordered: Vec<_> = steps.iter().collect();
    ordered.sort_by(|a, b| {
        a.record
            .position
            .cmp(&b.record.position)
            .then_with(|| a.record.name.cmp(&b.record.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// The step after `current`, or `None` at the end of the board.
pub fn next_step<'a>(
    steps: &'a [Stored<WorkflowStep>],
    current: &Uuid,
) -> Option<&'a Stored<WorkflowStep>> {
    let ordered = step_order(steps);
    let index = ordered.iter().position(|step| step.id == *current)?;
    ordered.get(index + 1).copied()
}

#[derive(Debug, Serialize)]
pub struct WorkflowColumn<'a> {
    pub step: &'a Stored<WorkflowStep>,
    pub tasks: Vec<&'a Stored<WorkflowTask>>,
    /// At least one task and every task done
    pub complete: bool,
}

impl WorkflowColumn<'_> {
    pub fn open_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.record.done).count()
    }
}

#[derive(Debug, Serialize)]
pub struct WorkflowBoard<'a> {
    pub columns: Vec<WorkflowColumn<'a>>,
    /// Tasks whose step no longer exists
    pub orphans: Vec<&'a Stored<WorkflowTask>>,
}

impl<'a> WorkflowBoard<'a> {
    pub fn build(steps: &'a [Stored<WorkflowStep>], tasks: &'a [Stored<WorkflowTask>]) -> Self {
        let columns: Vec<WorkflowColumn<'a>> = step_order(steps)
            .into_iter()
            .map(|step| {
                let mut column_tasks: Vec<&Stored<WorkflowTask>> =
                    tasks.iter().filter(|t| t.record.step_id == step.id).collect();
                column_tasks.sort_by_key(|t| (t.record.done, t.created_at));
                let complete =
                    !column_tasks.is_empty() && column_tasks.iter().all(|t| t.record.done);
                WorkflowColumn {
                    step,
                    tasks: column_tasks,
                    complete,
                }
            })
            .collect();

        let orphans = tasks
            .iter()
            .filter(|t| !steps.iter().any(|s| s.id == t.record.step_id))
            .collect();

        Self { columns, orphans }
    }

    pub fn open_tasks(&self) -> usize {
        self.columns.iter().map(|c| c.open_tasks()).sum::<usize>()
            + self.orphans.iter().filter(|t| !t.record.done).count()
    }
}
