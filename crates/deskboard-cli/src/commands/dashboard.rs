//! The cross-view overview.

use deskboard_core::dashboard::{Overview, OverviewInputs, MEETING_WINDOW_DAYS};
use deskboard_core::leave::Leave;
use deskboard_core::matter::Matter;
use deskboard_core::meeting::Meeting;
use deskboard_core::networth::NetWorthEntry;
use deskboard_core::project::Project;
use deskboard_core::sla::SlaStatus;
use deskboard_core::storage::RecordFilter;
use deskboard_core::workflow::{WorkflowStep, WorkflowTask};
use deskboard_core::StorageEngine;

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::output::print_json;
use crate::ui::theme::sla_badge;
use crate::ui::{
    badge, blank_line, columns, format_datetime, format_days, format_optional_date, kv, print,
    section, simple_table, Badge,
};

use super::networth::print_totals;
use super::{display_id, or_dash, print_header};

pub fn handle_dashboard(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let now = ctx.now()?;
    let sla = ctx.sla_config()?;

    let store = ctx.open_store()?;
    let all = RecordFilter::new();
    let matters = store.storage.list::<Matter>(&store.session, &all)?;
    let net_worth = store.storage.list::<NetWorthEntry>(&store.session, &all)?;
    let meetings = store.storage.list::<Meeting>(&store.session, &all)?;
    let leaves = store.storage.list::<Leave>(&store.session, &all)?;
    let projects = store.storage.list::<Project>(&store.session, &all)?;
    let workflow_steps = store.storage.list::<WorkflowStep>(&store.session, &all)?;
    let workflow_tasks = store.storage.list::<WorkflowTask>(&store.session, &all)?;

    let overview = Overview::build(
        OverviewInputs {
            matters: &matters,
            sla: &sla,
            net_worth: &net_worth,
            meetings: &meetings,
            leaves: &leaves,
            projects: &projects,
            workflow_steps: &workflow_steps,
            workflow_tasks: &workflow_tasks,
        },
        today,
        now,
    );

    if ui.mode.is_json() {
        return print_json(&overview);
    }

    let tz = ctx.timezone()?;
    let pretty = ui.mode.is_pretty();
    print_header(ctx, &ui, "dashboard", Some(&store.session.user_name));

    print(&ui, &section(&ui, "Matters"));
    let counts: Vec<String> = SlaStatus::ALL
        .iter()
        .filter(|status| status.is_open())
        .map(|status| {
            let count = overview.sla_counts.get(status).copied().unwrap_or(0);
            format!("{} {}", status.label(), count)
        })
        .collect();
    print(&ui, &kv(&ui, "Open", &counts.join(", ")));
    if overview.urgent_matters.is_empty() {
        print(&ui, &badge(&ui, Badge::Ok, "No matters need attention"));
    } else {
        let rows: Vec<Vec<String>> = overview
            .urgent_matters
            .iter()
            .map(|m| {
                vec![
                    badge(&ui, sla_badge(m.status), m.status.label()),
                    m.reference.clone(),
                    m.client.clone(),
                    m.stage.label().to_string(),
                    m.days_remaining.to_string(),
                ]
            })
            .collect();
        print(
            &ui,
            &simple_table(&ui, &columns(&["SLA", "Reference", "Client", "Stage", "Left"]), &rows),
        );
    }
    blank_line(&ui);

    print(&ui, &section(&ui, "Net Worth"));
    print_totals(&ui, &overview.net_worth);
    blank_line(&ui);

    let meeting_title = format!("Meetings (next {} days)", MEETING_WINDOW_DAYS);
    print(&ui, &section(&ui, &meeting_title));
    let rows: Vec<Vec<String>> = overview
        .upcoming_meetings
        .iter()
        .map(|m| {
            vec![
                format_datetime(&m.starts_at, tz, pretty),
                m.title.clone(),
                or_dash(m.location.as_deref()),
            ]
        })
        .collect();
    if rows.is_empty() {
        print(&ui, &kv(&ui, "Meetings", "none"));
    } else {
        print(&ui, &simple_table(&ui, &columns(&["Starts", "Title", "Location"]), &rows));
    }
    blank_line(&ui);

    print(&ui, &section(&ui, "Leave"));
    print(&ui, &kv(&ui, "Days Taken", &format_days(overview.leave_days_taken)));
    print(
        &ui,
        &kv(&ui, "On Leave Today", if overview.on_leave_today { "yes" } else { "no" }),
    );
    blank_line(&ui);

    print(&ui, &section(&ui, "Projects"));
    let rows: Vec<Vec<String>> = overview
        .active_projects
        .iter()
        .map(|p| {
            vec![
                display_id(&ui, &p.id),
                p.name.clone(),
                format_optional_date(p.due_on.as_ref()),
                format!("{:.0}%", p.progress.percent),
                p.progress.open_blockers.to_string(),
            ]
        })
        .collect();
    if rows.is_empty() {
        print(&ui, &kv(&ui, "Active", "none"));
    } else {
        print(
            &ui,
            &simple_table(&ui, &columns(&["ID", "Project", "Due", "Done", "Blockers"]), &rows),
        );
    }
    blank_line(&ui);

    print(&ui, &section(&ui, "Workflow"));
    print(&ui, &kv(&ui, "Open Tasks", &overview.open_workflow_tasks.to_string()));
    Ok(())
}
