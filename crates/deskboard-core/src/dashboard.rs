//! Cross-view overview shown on the dashboard landing page.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::leave::{Leave, LeaveStatus};
use crate::matter::{Matter, MatterStage};
use crate::meeting::{self, Meeting};
use crate::networth::{self, NetWorthEntry, NetWorthSummary};
use crate::project::{Project, ProjectProgress, ProjectStatus};
use crate::sla::{self, SlaConfig, SlaStatus};
use crate::storage::Stored;
use crate::workflow::{WorkflowBoard, WorkflowStep, WorkflowTask};

/// How many open matters the overview lists.
pub const URGENT_MATTER_LIMIT: usize = 5;

/// How far ahead the overview looks for meetings.
pub const MEETING_WINDOW_DAYS: i64 = 7;

/// Everything the overview reads, already scoped to one user.
#[derive(Debug, Clone, Copy)]
pub struct OverviewInputs<'a> {
    pub matters: &'a [Stored<Matter>],
    pub sla: &'a SlaConfig,
    pub net_worth: &'a [Stored<NetWorthEntry>],
    pub meetings: &'a [Stored<Meeting>],
    pub leaves: &'a [Stored<Leave>],
    pub projects: &'a [Stored<Project>],
    pub workflow_steps: &'a [Stored<WorkflowStep>],
    pub workflow_tasks: &'a [Stored<WorkflowTask>],
}

#[derive(Debug, Clone, Serialize)]
pub struct MatterAlert {
    pub id: Uuid,
    pub reference: String,
    pub client: String,
    pub stage: MatterStage,
    pub status: SlaStatus,
    pub elapsed_days: i64,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingSlot {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectLine {
    pub id: Uuid,
    pub name: String,
    pub due_on: Option<NaiveDate>,
    pub progress: ProjectProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub today: NaiveDate,
    pub sla_counts: BTreeMap<SlaStatus, usize>,
    /// Open matters needing attention, most severe first
    pub urgent_matters: Vec<MatterAlert>,
    pub net_worth: NetWorthSummary,
    pub upcoming_meetings: Vec<MeetingSlot>,
    /// Approved leave days in the current year
    pub leave_days_taken: f64,
    /// Leave that covers today
    pub on_leave_today: bool,
    pub active_projects: Vec<ProjectLine>,
    pub open_workflow_tasks: usize,
}

impl Overview {
    pub fn build(inputs: OverviewInputs<'_>, today: NaiveDate, now: DateTime<Utc>) -> Self {
        let evaluations: Vec<(&Stored<Matter>, sla::SlaEvaluation)> = inputs
            .matters
            .iter()
            .map(|m| (m, sla::evaluate(&m.record, inputs.sla, today)))
            .collect();
        let sla_counts = sla::status_counts(evaluations.iter().map(|(_, e)| e));

        let mut urgent: Vec<&(&Stored<Matter>, sla::SlaEvaluation)> = evaluations
            .iter()
            .filter(|(_, e)| e.status.needs_attention())
            .collect();
        urgent.sort_by(|(_, a), (_, b)| {
            b.status
                .cmp(&a.status)
                .then_with(|| a.days_remaining.cmp(&b.days_remaining))
        });
        let urgent_matters = urgent
            .into_iter()
            .take(URGENT_MATTER_LIMIT)
            .map(|(m, e)| MatterAlert {
                id: m.id,
                reference: m.record.reference.clone(),
                client: m.record.client.clone(),
                stage: m.record.stage,
                status: e.status,
                elapsed_days: e.elapsed_days,
                days_remaining: e.days_remaining,
            })
            .collect();

        let upcoming_meetings = meeting::upcoming(
            inputs.meetings,
            now,
            Duration::days(MEETING_WINDOW_DAYS),
            |m: &Stored<Meeting>| &m.record,
        )
        .into_iter()
        .map(|m| MeetingSlot {
            id: m.id,
            title: m.record.title.clone(),
            starts_at: m.record.starts_at,
            ends_at: m.record.ends_at(),
            location: m.record.location.clone(),
        })
        .collect();

        let leave_days_taken = inputs
            .leaves
            .iter()
            .filter(|l| l.record.status == LeaveStatus::Approved)
            .map(|l| l.record.working_days_in_year(today.year()))
            .sum();
        let on_leave_today = inputs
            .leaves
            .iter()
            .any(|l| l.record.status == LeaveStatus::Approved && l.record.contains(today));

        let mut active_projects: Vec<ProjectLine> = inputs
            .projects
            .iter()
            .filter(|p| p.record.status == ProjectStatus::Active)
            .map(|p| ProjectLine {
                id: p.id,
                name: p.record.name.clone(),
                due_on: p.record.due_on,
                progress: p.record.progress(today),
            })
            .collect();
        active_projects.sort_by(|a, b| {
            (a.due_on.is_none(), a.due_on, &a.name).cmp(&(b.due_on.is_none(), b.due_on, &b.name))
        });

        let board = WorkflowBoard::build(inputs.workflow_steps, inputs.workflow_tasks);

        Self {
            today,
            sla_counts,
            urgent_matters,
            net_worth: networth::summarize(inputs.net_worth, Some(today)),
            upcoming_meetings,
            leave_days_taken,
            on_leave_today,
            active_projects,
            open_workflow_tasks: board.open_tasks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::LeaveType;
    use crate::money::Money;
    use crate::networth::NetWorthType;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn stored<R>(record: R) -> Stored<R> {
        Stored {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            record,
        }
    }

    #[test]
    fn test_overview_collects_each_view() {
        let today = date("2025-03-20");
        let now = DateTime::parse_from_rfc3339("2025-03-20T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let matters = vec![
            stored(Matter::new("M-1", "Acme", MatterStage::Intake, date("2025-03-01"))),
            stored(Matter::new("M-2", "Beta", MatterStage::Intake, date("2025-03-14"))),
            stored(Matter::new("M-3", "Gamma", MatterStage::Intake, date("2025-03-19"))),
        ];
        let net_worth = vec![
            stored(NetWorthEntry::new(
                NetWorthType::Asset,
                "Cash",
                Money::from_cents(5_000),
                date("2025-03-01"),
            )),
            stored(NetWorthEntry::new(
                NetWorthType::Loan,
                "Card",
                Money::from_cents(1_000),
                date("2025-03-01"),
            )),
        ];
        let meetings = vec![
            stored(Meeting::new("Tomorrow", now + Duration::days(1), 30)),
            stored(Meeting::new("Next month", now + Duration::days(30), 30)),
        ];
        let mut leave = Leave::new(LeaveType::Annual, date("2025-03-17"), date("2025-03-21"));
        leave.status = LeaveStatus::Approved;
        let leaves = vec![stored(leave)];
        let mut project = Project::new("Launch");
        project.add_task("Ship", None).unwrap();
        let projects = vec![stored(project)];
        let config = SlaConfig::default();

        let overview = Overview::build(
            OverviewInputs {
                matters: &matters,
                sla: &config,
                net_worth: &net_worth,
                meetings: &meetings,
                leaves: &leaves,
                projects: &projects,
                workflow_steps: &[],
                workflow_tasks: &[],
            },
            today,
            now,
        );

        assert_eq!(overview.sla_counts[&SlaStatus::Overdue], 1);
        assert_eq!(overview.sla_counts[&SlaStatus::AtRisk], 1);
        assert_eq!(overview.sla_counts[&SlaStatus::WithinSla], 1);
        assert_eq!(overview.urgent_matters.len(), 2);
        assert_eq!(overview.urgent_matters[0].reference, "M-1");
        assert_eq!(overview.net_worth.net, Money::from_cents(4_000));
        assert_eq!(overview.upcoming_meetings.len(), 1);
        assert_eq!(overview.leave_days_taken, 5.0);
        assert!(overview.on_leave_today);
        assert_eq!(overview.active_projects[0].progress.total, 1);
        assert_eq!(overview.open_workflow_tasks, 0);
    }
}
