//! Project board: projects with tasks, notes and blockers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeskError, Result};
use crate::record::{parse_choice, Record, RecordKind};
use crate::storage::Stored;
use crate::validation::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    OnHold,
    Completed,
    Archived,
}

const PROJECT_STATUSES: [(ProjectStatus, &str, &str); 4] = [
    (ProjectStatus::Active, "active", "Active"),
    (ProjectStatus::OnHold, "on_hold", "On Hold"),
    (ProjectStatus::Completed, "completed", "Completed"),
    (ProjectStatus::Archived, "archived", "Archived"),
];

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Active,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
        ProjectStatus::Archived,
    ];
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = PROJECT_STATUSES
            .iter()
            .find(|(status, _, _)| status == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for ProjectStatus {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &PROJECT_STATUSES, "project status")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

const TASK_STATUSES: [(TaskStatus, &str, &str); 3] = [
    (TaskStatus::Todo, "todo", "To Do"),
    (TaskStatus::InProgress, "in_progress", "In Progress"),
    (TaskStatus::Done, "done", "Done"),
];

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = TASK_STATUSES
            .iter()
            .find(|(status, _, _)| status == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown");
        f.write_str(label)
    }
}

impl FromStr for TaskStatus {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        parse_choice(value, &TASK_STATUSES, "task status")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
}

impl ProjectTask {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_on.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNote {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub id: Uuid,
    pub description: String,
    pub raised_on: NaiveDate,
    #[serde(default)]
    pub resolved_on: Option<NaiveDate>,
}

impl Blocker {
    pub fn is_open(&self) -> bool {
        self.resolved_on.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<ProjectTask>,
    #[serde(default)]
    pub notes: Vec<ProjectNote>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
}

/// Task counts and open issues for a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectProgress {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    /// Share of done tasks, 0 when there are no tasks
    pub percent: f64,
    pub open_blockers: usize,
    pub overdue_tasks: usize,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: ProjectStatus::Active,
            due_on: None,
            tasks: Vec::new(),
            notes: Vec::new(),
            blockers: Vec::new(),
        }
    }

    pub fn add_task(&mut self, title: &str, due_on: Option<NaiveDate>) -> Result<Uuid> {
        require_text("Task title", title)?;
        let id = Uuid::new_v4();
        self.tasks.push(ProjectTask {
            id,
            title: title.trim().to_string(),
            status: TaskStatus::Todo,
            due_on,
        });
        Ok(id)
    }

    pub fn task(&self, id: &Uuid) -> Result<&ProjectTask> {
        self.tasks
            .iter()
            .find(|task| task.id == *id)
            .ok_or_else(|| DeskError::NotFound(format!("task {}", id)))
    }

    pub fn set_task_status(&mut self, id: &Uuid, status: TaskStatus) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == *id)
            .ok_or_else(|| DeskError::NotFound(format!("task {}", id)))?;
        task.status = status;
        Ok(())
    }

    pub fn remove_task(&mut self, id: &Uuid) -> Result<ProjectTask> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == *id)
            .ok_or_else(|| DeskError::NotFound(format!("task {}", id)))?;
        Ok(self.tasks.remove(index))
    }

    pub fn add_note(&mut self, body: &str, now: DateTime<Utc>) -> Result<Uuid> {
        require_text("Note", body)?;
        let id = Uuid::new_v4();
        self.notes.push(ProjectNote {
            id,
            body: body.to_string(),
            created_at: now,
        });
        Ok(id)
    }

    pub fn raise_blocker(&mut self, description: &str, on: NaiveDate) -> Result<Uuid> {
        require_text("Blocker", description)?;
        let id = Uuid::new_v4();
        self.blockers.push(Blocker {
            id,
            description: description.trim().to_string(),
            raised_on: on,
            resolved_on: None,
        });
        Ok(id)
    }

    pub fn resolve_blocker(&mut self, id: &Uuid, on: NaiveDate) -> Result<()> {
        let blocker = self
            .blockers
            .iter_mut()
            .find(|blocker| blocker.id == *id)
            .ok_or_else(|| DeskError::NotFound(format!("blocker {}", id)))?;
        if let Some(resolved) = blocker.resolved_on {
            return Err(DeskError::Validation(format!(
                "Blocker already resolved on {}",
                resolved
            )));
        }
        if on < blocker.raised_on {
            return Err(DeskError::Validation(format!(
                "Resolution date {} is before the blocker was raised ({})",
                on, blocker.raised_on
            )));
        }
        blocker.resolved_on = Some(on);
        Ok(())
    }

    pub fn open_blockers(&self) -> impl Iterator<Item = &Blocker> {
        self.blockers.iter().filter(|b| b.is_open())
    }

    pub fn progress(&self, today: NaiveDate) -> ProjectProgress {
        let count = |status: TaskStatus| self.tasks.iter().filter(|t| t.status == status).count();
        let total = self.tasks.len();
        let done = count(TaskStatus::Done);
        ProjectProgress {
            total,
            todo: count(TaskStatus::Todo),
            in_progress: count(TaskStatus::InProgress),
            done,
            percent: if total == 0 {
                0.0
            } else {
                done as f64 * 100.0 / total as f64
            },
            open_blockers: self.open_blockers().count(),
            overdue_tasks: self.tasks.iter().filter(|t| t.is_overdue(today)).count(),
        }
    }
}

impl Record for Project {
    const KIND: RecordKind = RecordKind::Project;

    fn validate(&self) -> Result<()> {
        require_text("Name", &self.name)?;
        for task in &self.tasks {
            require_text("Task title", &task.title)?;
        }
        for blocker in &self.blockers {
            if blocker.resolved_on.is_some_and(|resolved| resolved < blocker.raised_on) {
                return Err(DeskError::Validation(format!(
                    "Blocker {} is resolved before it was raised",
                    blocker.id
                )));
            }
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.name.clone()];
        parts.extend(self.description.clone());
        parts.extend(self.tasks.iter().map(|t| t.title.clone()));
        parts.extend(self.notes.iter().map(|n| n.body.clone()));
        parts.extend(self.blockers.iter().map(|b| b.description.clone()));
        parts.join(" ")
    }
}

/// One status column on the project board.
#[derive(Debug, Serialize)]
pub struct BoardColumn<'a> {
    pub status: ProjectStatus,
    pub projects: Vec<&'a Stored<Project>>,
}

/// Group projects into status columns, each sorted by due date then name.
/// Projects without a due date sort last.
pub fn board(projects: &[Stored<Project>]) -> Vec<BoardColumn<'_>> {
    ProjectStatus::ALL
        .iter()
        .map(|status| {
            let mut items: Vec<&Stored<Project>> = projects
                .iter()
                .filter(|p| p.record.status == *status)
                .collect();
            items.sort_by(|a, b| {
                let due = |p: &Stored<Project>| (p.record.due_on.is_none(), p.record.due_on);
                due(*a)
                    .cmp(&due(*b))
                    .then_with(|| a.record.name.to_lowercase().cmp(&b.record.name.to_lowercase()))
            });
            BoardColumn {
                status: *status,
                projects: items,
            }
        })
        .collect()
}
