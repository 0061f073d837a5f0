use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::workflow::{self, WorkflowBoard, WorkflowStep, WorkflowTask};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::{AppContext, OpenStore};
use crate::cli::{OutputArgs, WorkflowCommand, WorkflowStepCommand, WorkflowTaskCommand};
use crate::errors::CliError;
use crate::helpers::{find_record, parse_optional_date};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::{blank_line, columns, format_optional_date, print, section, simple_table, UiContext};

use super::{display_id, or_dash, print_header};

const STEP_HINT: &str = "Hint: Run `deskboard workflow step list` to find step IDs.";
const TASK_HINT: &str = "Hint: Run `deskboard workflow board` to find task IDs.";

pub fn handle(ctx: &AppContext, command: &WorkflowCommand) -> anyhow::Result<()> {
    match command {
        WorkflowCommand::Step(step) => match step {
            WorkflowStepCommand::Add {
                name,
                position,
                description,
            } => handle_step_add(ctx, name, *position, description.as_deref()),
            WorkflowStepCommand::List(output) => handle_step_list(ctx, output),
            WorkflowStepCommand::Delete { id, force } => handle_step_delete(ctx, id, *force),
        },
        WorkflowCommand::Task(task) => match task {
            WorkflowTaskCommand::Add {
                step,
                title,
                assignee,
                due,
            } => handle_task_add(ctx, step, title, assignee.as_deref(), due.as_deref()),
            WorkflowTaskCommand::Done { id } => handle_task_done(ctx, id),
            WorkflowTaskCommand::Move { id, to } => handle_task_move(ctx, id, to.as_deref()),
            WorkflowTaskCommand::Delete { id } => handle_task_delete(ctx, id),
        },
        WorkflowCommand::Board(output) => handle_board(ctx, output),
    }
}

fn load_steps(store: &OpenStore) -> anyhow::Result<Vec<Stored<WorkflowStep>>> {
    Ok(store
        .storage
        .list::<WorkflowStep>(&store.session, &RecordFilter::new())?)
}

fn load_tasks(store: &OpenStore) -> anyhow::Result<Vec<Stored<WorkflowTask>>> {
    Ok(store
        .storage
        .list::<WorkflowTask>(&store.session, &RecordFilter::new())?)
}

fn handle_step_add(
    ctx: &AppContext,
    name: &str,
    position: Option<i32>,
    description: Option<&str>,
) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let position = match position {
        Some(position) => position,
        None => load_steps(&store)?
            .iter()
            .map(|s| s.record.position)
            .max()
            .map_or(0, |last| last.saturating_add(1)),
    };
    let step = WorkflowStep {
        name: name.trim().to_string(),
        position,
        description: description.map(str::to_string).filter(|d| !d.trim().is_empty()),
    };
    let id = store.storage.insert(&store.session, &step)?;
    store.close()?;

    let id = id.to_string();
    let position = step.position.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Added step",
        &[("ID", &id), ("Name", &step.name), ("Position", &position)],
    );
    Ok(())
}

fn handle_step_list(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let store = ctx.open_store()?;
    let steps = load_steps(&store)?;
    let tasks = load_tasks(&store)?;
    let board = WorkflowBoard::build(&steps, &tasks);

    if ui.mode.is_json() {
        let values = board
            .columns
            .iter()
            .map(|c| {
                record_json(
                    c.step,
                    serde_json::json!({ "tasks": c.tasks.len(), "open_tasks": c.open_tasks() }),
                )
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let rows: Vec<Vec<String>> = board
        .columns
        .iter()
        .map(|c| {
            vec![
                display_id(&ui, &c.step.id),
                c.step.record.position.to_string(),
                c.step.record.name.clone(),
                c.tasks.len().to_string(),
                or_dash(c.step.record.description.as_deref()),
            ]
        })
        .collect();

    print_header(ctx, &ui, "workflow step list", Some(&rows.len().to_string()));
    print(
        &ui,
        &simple_table(
            &ui,
            &columns(&["ID", "Position", "Name", "Tasks", "Description"]),
            &rows,
        ),
    );
    Ok(())
}

fn handle_step_delete(ctx: &AppContext, id: &str, force: bool) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let step = find_record::<WorkflowStep>(&store.storage, &store.session, id, STEP_HINT)?;
    let tasks: Vec<Stored<WorkflowTask>> = load_tasks(&store)?
        .into_iter()
        .filter(|t| t.record.step_id == step.id)
        .collect();

    if !tasks.is_empty() && !force {
        return Err(CliError::invalid_input(format!(
            "Step \"{}\" still has {} task(s); move them or pass --force to delete them too",
            step.record.name,
            tasks.len()
        ))
        .into());
    }
    for task in &tasks {
        store.storage.delete(&store.session, RecordKind::WorkflowTask, &task.id)?;
    }
    store.storage.delete(&store.session, RecordKind::WorkflowStep, &step.id)?;
    store.close()?;

    let id = step.id.to_string();
    let removed = tasks.len().to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Deleted step",
        &[("ID", &id), ("Tasks Deleted", &removed)],
    );
    Ok(())
}

fn handle_task_add(
    ctx: &AppContext,
    step: &str,
    title: &str,
    assignee: Option<&str>,
    due: Option<&str>,
) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let due_on = parse_optional_date(due, today)?;

    let mut store = ctx.open_store()?;
    let step = find_record::<WorkflowStep>(&store.storage, &store.session, step, STEP_HINT)?;
    let task = WorkflowTask {
        step_id: step.id,
        title: title.trim().to_string(),
        assignee: assignee.map(str::to_string).filter(|a| !a.trim().is_empty()),
        done: false,
        due_on,
    };
    let id = store.storage.insert(&store.session, &task)?;
    store.close()?;

    let id = id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Added task",
        &[("ID", &id), ("Step", &step.record.name)],
    );
    Ok(())
}

fn handle_task_done(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let mut task = find_record::<WorkflowTask>(&store.storage, &store.session, id, TASK_HINT)?;
    if task.record.done {
        return Err(CliError::invalid_input(format!(
            "Task \"{}\" is already done",
            task.record.title
        ))
        .into());
    }
    task.record.done = true;
    store.storage.update(&store.session, &task.id, &task.record)?;
    store.close()?;

    let id = task.id.to_string();
    print_receipt(&ui, ctx.quiet(), "Completed task", &[("ID", &id)]);
    Ok(())
}

fn handle_task_move(ctx: &AppContext, id: &str, to: Option<&str>) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let mut task = find_record::<WorkflowTask>(&store.storage, &store.session, id, TASK_HINT)?;
    let steps = load_steps(&store)?;

    let target = match to {
        Some(step) => find_record::<WorkflowStep>(&store.storage, &store.session, step, STEP_HINT)?,
        None => workflow::next_step(&steps, &task.record.step_id)
            .cloned()
            .ok_or_else(|| {
                CliError::invalid_input(format!(
                    "Task \"{}\" is already in the last step (or its step is gone); pass --to",
                    task.record.title
                ))
            })?,
    };
    if target.id == task.record.step_id {
        return Err(CliError::invalid_input(format!(
            "Task is already in step \"{}\"",
            target.record.name
        ))
        .into());
    }

    task.record.step_id = target.id;
    store.storage.update(&store.session, &task.id, &task.record)?;
    store.close()?;

    let id = task.id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Moved task",
        &[("ID", &id), ("Step", &target.record.name)],
    );
    Ok(())
}

fn handle_task_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let task = find_record::<WorkflowTask>(&store.storage, &store.session, id, TASK_HINT)?;
    store.storage.delete(&store.session, RecordKind::WorkflowTask, &task.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "task", &task.id);
    Ok(())
}

fn task_rows(ui: &UiContext, tasks: &[&Stored<WorkflowTask>]) -> Vec<Vec<String>> {
    tasks
        .iter()
        .map(|t| {
            vec![
                display_id(ui, &t.id),
                if t.record.done { "x" } else { " " }.to_string(),
                t.record.title.clone(),
                or_dash(t.record.assignee.as_deref()),
                format_optional_date(t.record.due_on.as_ref()),
            ]
        })
        .collect()
}

const TASK_COLUMNS: [&str; 5] = ["ID", "Done", "Task", "Assignee", "Due"];

fn handle_board(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let store = ctx.open_store()?;
    let steps = load_steps(&store)?;
    let tasks = load_tasks(&store)?;
    let board = WorkflowBoard::build(&steps, &tasks);

    if ui.mode.is_json() {
        let mut columns_json = Vec::new();
        for column in &board.columns {
            let tasks = column
                .tasks
                .iter()
                .map(|t| record_json(t, serde_json::Value::Null))
                .collect::<anyhow::Result<Vec<_>>>()?;
            columns_json.push(serde_json::json!({
                "step": record_json(column.step, serde_json::Value::Null)?,
                "complete": column.complete,
                "tasks": tasks,
            }));
        }
        let orphans = board
            .orphans
            .iter()
            .map(|t| record_json(t, serde_json::Value::Null))
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&serde_json::json!({
            "columns": columns_json,
            "orphans": orphans,
            "open_tasks": board.open_tasks(),
        }));
    }

    print_header(ctx, &ui, "workflow board", Some(&format!("{} open", board.open_tasks())));
    for column in &board.columns {
        let mut title = format!("{} ({})", column.step.record.name, column.tasks.len());
        if column.complete {
            title.push_str(" complete");
        }
        print(&ui, &section(&ui, &title));
        print(&ui, &simple_table(&ui, &columns(&TASK_COLUMNS), &task_rows(&ui, &column.tasks)));
        blank_line(&ui);
    }
    if !board.orphans.is_empty() {
        print(&ui, &section(&ui, "Unassigned"));
        print(&ui, &simple_table(&ui, &columns(&TASK_COLUMNS), &task_rows(&ui, &board.orphans)));
    }
    Ok(())
}
