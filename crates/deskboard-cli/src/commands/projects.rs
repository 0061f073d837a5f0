use deskboard_core::project::{self, Project, ProjectProgress, ProjectStatus, TaskStatus};
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::{AppContext, OpenStore};
use crate::cli::{OutputArgs, ProjectCommand, ProjectTaskCommand};
use crate::errors::CliError;
use crate::helpers::{find_record, parse_choice, parse_optional_date, pick};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::{
    blank_line, columns, format_datetime, format_optional_date, kv, print, section,
    simple_table, UiContext,
};

use super::{display_id, or_dash, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard project list` to find project IDs.";

pub fn handle(ctx: &AppContext, command: &ProjectCommand) -> anyhow::Result<()> {
    match command {
        ProjectCommand::Add {
            name,
            description,
            due,
        } => handle_add(ctx, name, description.as_deref(), due.as_deref()),
        ProjectCommand::List { status, output } => handle_list(ctx, status.as_deref(), output),
        ProjectCommand::Show { id, output } => handle_show(ctx, id, output),
        ProjectCommand::Board(output) => handle_board(ctx, output),
        ProjectCommand::Update {
            id,
            name,
            status,
            description,
            due,
        } => handle_update(
            ctx,
            id,
            name.as_deref(),
            status.as_deref(),
            description.as_deref(),
            due.as_deref(),
        ),
        ProjectCommand::Task(task) => handle_task(ctx, task),
        ProjectCommand::Note { project, body } => {
            let now = ctx.now()?;
            mutate(ctx, project, "Added note", |p| {
                Ok(Some(p.add_note(body, now)?.to_string()))
            })
        }
        ProjectCommand::Block {
            project,
            description,
            on,
        } => {
            let today = ctx.today()?;
            let on = parse_optional_date(on.as_deref(), today)?.unwrap_or(today);
            mutate(ctx, project, "Raised blocker", |p| {
                Ok(Some(p.raise_blocker(description, on)?.to_string()))
            })
        }
        ProjectCommand::Unblock {
            project,
            blocker,
            on,
        } => {
            let today = ctx.today()?;
            let on = parse_optional_date(on.as_deref(), today)?.unwrap_or(today);
            mutate(ctx, project, "Resolved blocker", |p| {
                let id = pick(&p.blockers, blocker, "blocker", |b| b.id)?.id;
                p.resolve_blocker(&id, on)?;
                Ok(Some(id.to_string()))
            })
        }
        ProjectCommand::Delete { id } => handle_delete(ctx, id),
    }
}

fn handle_task(ctx: &AppContext, command: &ProjectTaskCommand) -> anyhow::Result<()> {
    match command {
        ProjectTaskCommand::Add {
            project,
            title,
            due,
        } => {
            let today = ctx.today()?;
            let due = parse_optional_date(due.as_deref(), today)?;
            mutate(ctx, project, "Added task", |p| {
                Ok(Some(p.add_task(title, due)?.to_string()))
            })
        }
        ProjectTaskCommand::Status {
            project,
            task,
            status,
        } => {
            let status: TaskStatus = parse_choice(status)?;
            mutate(ctx, project, "Updated task", |p| {
                let id = pick(&p.tasks, task, "task", |t| t.id)?.id;
                p.set_task_status(&id, status)?;
                Ok(Some(id.to_string()))
            })
        }
        ProjectTaskCommand::Remove { project, task } => {
            mutate(ctx, project, "Removed task", |p| {
                let id = pick(&p.tasks, task, "task", |t| t.id)?.id;
                p.remove_task(&id)?;
                Ok(Some(id.to_string()))
            })
        }
    }
}

/// Load a project, apply `change`, and save it.
///
/// `change` returns the ID of the item it touched, if any, for the receipt.
fn mutate<F>(ctx: &AppContext, project: &str, title: &str, change: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Project) -> anyhow::Result<Option<String>>,
{
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let mut stored = find_record::<Project>(&store.storage, &store.session, project, LIST_HINT)?;
    let item = change(&mut stored.record)?;
    save(&mut store, &stored)?;
    store.close()?;

    let project_id = stored.id.to_string();
    let mut items = vec![("Project", project_id.as_str())];
    if let Some(item) = item.as_deref() {
        items.push(("ID", item));
    }
    print_receipt(&ui, ctx.quiet(), title, &items);
    Ok(())
}

fn save(store: &mut OpenStore, stored: &Stored<Project>) -> anyhow::Result<()> {
    store.storage.update(&store.session, &stored.id, &stored.record)?;
    Ok(())
}

fn handle_add(
    ctx: &AppContext,
    name: &str,
    description: Option<&str>,
    due: Option<&str>,
) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let mut project = Project::new(name.trim());
    project.description = description.map(str::to_string).filter(|d| !d.trim().is_empty());
    project.due_on = parse_optional_date(due, today)?;

    let mut store = ctx.open_store()?;
    let id = store.storage.insert(&store.session, &project)?;
    store.close()?;

    let id = id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Created project",
        &[("ID", &id), ("Name", &project.name)],
    );
    Ok(())
}

fn progress_cell(progress: &ProjectProgress) -> String {
    format!("{}/{} ({:.0}%)", progress.done, progress.total, progress.percent)
}

fn project_json(stored: &Stored<Project>, today: chrono::NaiveDate) -> anyhow::Result<serde_json::Value> {
    record_json(
        stored,
        serde_json::json!({ "progress": stored.record.progress(today) }),
    )
}

fn project_rows(ui: &UiContext, projects: &[&Stored<Project>], today: chrono::NaiveDate) -> Vec<Vec<String>> {
    projects
        .iter()
        .map(|p| {
            let progress = p.record.progress(today);
            vec![
                display_id(ui, &p.id),
                p.record.name.clone(),
                p.record.status.to_string(),
                format_optional_date(p.record.due_on.as_ref()),
                progress_cell(&progress),
                progress.open_blockers.to_string(),
            ]
        })
        .collect()
}

const PROJECT_COLUMNS: [&str; 6] = ["ID", "Name", "Status", "Due", "Tasks", "Blockers"];

fn handle_list(ctx: &AppContext, status: Option<&str>, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let status = status.map(parse_choice::<ProjectStatus>).transpose()?;

    let store = ctx.open_store()?;
    let projects = store.storage.list::<Project>(&store.session, &RecordFilter::new())?;
    let shown: Vec<&Stored<Project>> = projects
        .iter()
        .filter(|p| status.map_or(true, |s| p.record.status == s))
        .collect();

    if ui.mode.is_json() {
        let values = shown
            .iter()
            .map(|p| project_json(p, today))
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    print_header(ctx, &ui, "project list", Some(&shown.len().to_string()));
    print(
        &ui,
        &simple_table(&ui, &columns(&PROJECT_COLUMNS), &project_rows(&ui, &shown, today)),
    );
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let store = ctx.open_store()?;
    let stored = find_record::<Project>(&store.storage, &store.session, id, LIST_HINT)?;

    if ui.mode.is_json() {
        return print_json(&project_json(&stored, today)?);
    }

    let project = &stored.record;
    let progress = project.progress(today);
    let tz = ctx.timezone()?;
    let pretty = ui.mode.is_pretty();

    print_header(ctx, &ui, "project show", Some(&project.name));
    print(&ui, &kv(&ui, "ID", &stored.id.to_string()));
    print(&ui, &kv(&ui, "Name", &project.name));
    print(&ui, &kv(&ui, "Status", &project.status.to_string()));
    print(&ui, &kv(&ui, "Due", &format_optional_date(project.due_on.as_ref())));
    print(&ui, &kv(&ui, "Description", &or_dash(project.description.as_deref())));
    print(&ui, &kv(&ui, "Progress", &progress_cell(&progress)));
    print(&ui, &kv(&ui, "Overdue Tasks", &progress.overdue_tasks.to_string()));
    blank_line(&ui);

    print(&ui, &section(&ui, "Tasks"));
    let task_rows: Vec<Vec<String>> = project
        .tasks
        .iter()
        .map(|t| {
            vec![
                display_id(&ui, &t.id),
                t.title.clone(),
                t.status.to_string(),
                format_optional_date(t.due_on.as_ref()),
            ]
        })
        .collect();
    print(&ui, &simple_table(&ui, &columns(&["ID", "Task", "Status", "Due"]), &task_rows));
    blank_line(&ui);

    print(&ui, &section(&ui, "Blockers"));
    let blocker_rows: Vec<Vec<String>> = project
        .blockers
        .iter()
        .map(|b| {
            vec![
                display_id(&ui, &b.id),
                b.description.clone(),
                format_optional_date(Some(&b.raised_on)),
                format_optional_date(b.resolved_on.as_ref()),
            ]
        })
        .collect();
    print(
        &ui,
        &simple_table(&ui, &columns(&["ID", "Blocker", "Raised", "Resolved"]), &blocker_rows),
    );
    blank_line(&ui);

    print(&ui, &section(&ui, "Notes"));
    let note_rows: Vec<Vec<String>> = project
        .notes
        .iter()
        .map(|n| {
            vec![
                display_id(&ui, &n.id),
                format_datetime(&n.created_at, tz, pretty),
                n.body.clone(),
            ]
        })
        .collect();
    print(&ui, &simple_table(&ui, &columns(&["ID", "Added", "Note"]), &note_rows));
    Ok(())
}

fn handle_board(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let store = ctx.open_store()?;
    let projects = store.storage.list::<Project>(&store.session, &RecordFilter::new())?;
    let board = project::board(&projects);

    if ui.mode.is_json() {
        let mut columns_json = Vec::new();
        for column in &board {
            let items = column
                .projects
                .iter()
                .map(|p| project_json(p, today))
                .collect::<anyhow::Result<Vec<_>>>()?;
            columns_json.push(serde_json::json!({
                "status": column.status,
                "projects": items,
            }));
        }
        return print_json(&columns_json);
    }

    print_header(ctx, &ui, "project board", Some(&projects.len().to_string()));
    for column in &board {
        let title = format!("{} ({})", column.status, column.projects.len());
        print(&ui, &section(&ui, &title));
        print(
            &ui,
            &simple_table(&ui, &columns(&PROJECT_COLUMNS), &project_rows(&ui, &column.projects, today)),
        );
        blank_line(&ui);
    }
    Ok(())
}

fn handle_update(
    ctx: &AppContext,
    id: &str,
    name: Option<&str>,
    status: Option<&str>,
    description: Option<&str>,
    due: Option<&str>,
) -> anyhow::Result<()> {
    if name.is_none() && status.is_none() && description.is_none() && due.is_none() {
        return Err(CliError::invalid_input(
            "Nothing to update; pass --name, --status, --description or --due",
        )
        .into());
    }
    let today = ctx.today()?;
    let status = status.map(parse_choice::<ProjectStatus>).transpose()?;
    let due = parse_optional_date(due, today)?;

    mutate(ctx, id, "Updated project", |p| {
        if let Some(name) = name {
            p.name = name.trim().to_string();
        }
        if let Some(status) = status {
            p.status = status;
        }
        if let Some(description) = description {
            p.description = Some(description.to_string()).filter(|d| !d.trim().is_empty());
        }
        if due.is_some() {
            p.due_on = due;
        }
        Ok(None)
    })
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<Project>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::Project, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "project", &stored.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_progress_cell() {
        let mut project = Project::new("Launch");
        let a = project.add_task("Draft", None).unwrap();
        project.add_task("Review", None).unwrap();
        project.set_task_status(&a, TaskStatus::Done).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(progress_cell(&project.progress(today)), "1/2 (50%)");
    }
}
