use deskboard_core::matter::{Matter, MatterStage, Priority};
use deskboard_core::sla::{self, SlaConfig, SlaEvaluation, SlaStatus};
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{MatterAddArgs, MatterCommand, MatterListArgs, MatterUpdateArgs, OutputArgs};
use crate::constants::DEFAULT_LIST_LIMIT;
use crate::errors::CliError;
use crate::helpers::{find_record, parse_choice, parse_optional_date};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::theme::{sla_badge, styled};
use crate::ui::{
    blank_line, columns, format_date, format_optional_date, kv, print, section, simple_table,
    table, UiContext,
};

use super::{display_id, or_dash, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard matter list` to find matter IDs.";

pub fn handle(ctx: &AppContext, command: &MatterCommand) -> anyhow::Result<()> {
    match command {
        MatterCommand::Add(args) => handle_add(ctx, args),
        MatterCommand::List(args) => handle_list(ctx, args),
        MatterCommand::Show { id, output } => handle_show(ctx, id, output),
        MatterCommand::Update(args) => handle_update(ctx, args),
        MatterCommand::Complete { id, on } => handle_complete(ctx, id, on.as_deref()),
        MatterCommand::Delete { id } => handle_delete(ctx, id),
        MatterCommand::Sla(output) => handle_sla(ctx, output),
    }
}

fn handle_add(ctx: &AppContext, args: &MatterAddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let stage: MatterStage = parse_choice(&args.stage)?;
    let priority: Priority = parse_choice(&args.priority)?;
    let opened_on = parse_optional_date(args.opened.as_deref(), today)?.unwrap_or(today);

    let mut matter = Matter::new(args.reference.trim(), args.client.trim(), stage, opened_on);
    matter.category = args.category.trim().to_string();
    matter.priority = priority;
    matter.assignee = args.assignee.clone();
    matter.notes = args.notes.clone();
    // A matter opened past intake entered its stage on the opening date
    if stage != MatterStage::Intake {
        matter.stage_entered_on = Some(opened_on);
    }
    if stage >= MatterStage::Submitted {
        matter.submitted_on = Some(opened_on);
    }

    let mut store = ctx.open_store()?;
    let id = store.storage.insert(&store.session, &matter)?;
    store.close()?;

    let evaluation = sla::evaluate(&matter, &ctx.sla_config()?, today);
    let id = id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Opened matter",
        &[
            ("ID", &id),
            ("Reference", &matter.reference),
            ("Stage", matter.stage.label()),
            ("SLA", evaluation.status.label()),
        ],
    );
    Ok(())
}

fn evaluated(
    matters: Vec<Stored<Matter>>,
    config: &SlaConfig,
    today: chrono::NaiveDate,
) -> Vec<(Stored<Matter>, SlaEvaluation)> {
    matters
        .into_iter()
        .map(|m| {
            let evaluation = sla::evaluate(&m.record, config, today);
            (m, evaluation)
        })
        .collect()
}

fn matter_json(
    stored: &Stored<Matter>,
    evaluation: &SlaEvaluation,
    today: chrono::NaiveDate,
) -> anyhow::Result<serde_json::Value> {
    record_json(
        stored,
        serde_json::json!({
            "days": stored.record.day_counts(today),
            "sla": evaluation,
        }),
    )
}

fn status_cell(ui: &UiContext, status: SlaStatus) -> String {
    let label = if ui.mode.is_pretty() {
        status.label().to_string()
    } else {
        status_key(status)
    };
    styled(&label, sla_badge(status).style(), ui.color)
}

fn status_key(status: SlaStatus) -> String {
    status.label().to_lowercase().replace(' ', "_")
}

fn handle_list(ctx: &AppContext, args: &MatterListArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output);
    let today = ctx.today()?;
    let config = ctx.sla_config()?;
    let stage = args.stage.as_deref().map(parse_choice::<MatterStage>).transpose()?;
    let status = args.status.as_deref().map(parse_choice::<SlaStatus>).transpose()?;

    let store = ctx.open_store()?;
    let matters = store.storage.list::<Matter>(&store.session, &RecordFilter::new())?;
    let limit = args.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let rows: Vec<(Stored<Matter>, SlaEvaluation)> = evaluated(matters, &config, today)
        .into_iter()
        .filter(|(m, _)| stage.map_or(true, |s| m.record.stage == s))
        .filter(|(_, e)| status.map_or(true, |s| e.status == s))
        .filter(|(m, _)| !args.open || !m.record.is_completed())
        .take(limit)
        .collect();

    if ui.mode.is_json() {
        let values = rows
            .iter()
            .map(|(m, e)| matter_json(m, e, today))
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(m, e)| {
            vec![
                display_id(&ui, &m.id),
                m.record.reference.clone(),
                m.record.client.clone(),
                m.record.stage.label().to_string(),
                e.elapsed_days.to_string(),
                status_cell(&ui, e.status),
                e.days_remaining.to_string(),
            ]
        })
        .collect();

    print_header(ctx, &ui, "matter list", Some(&rows.len().to_string()));
    print(
        &ui,
        &simple_table(
            &ui,
            &columns(&["ID", "Reference", "Client", "Stage", "Days", "SLA", "Left"]),
            &table_rows,
        ),
    );
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let config = ctx.sla_config()?;
    let store = ctx.open_store()?;
    let stored = find_record::<Matter>(&store.storage, &store.session, id, LIST_HINT)?;
    let evaluation = sla::evaluate(&stored.record, &config, today);

    if ui.mode.is_json() {
        return print_json(&matter_json(&stored, &evaluation, today)?);
    }

    let matter = &stored.record;
    let days = matter.day_counts(today);
    print_header(ctx, &ui, "matter show", Some(&matter.reference));
    let lines = [
        kv(&ui, "ID", &stored.id.to_string()),
        kv(&ui, "Reference", &matter.reference),
        kv(&ui, "Client", &matter.client),
        kv(&ui, "Category", &or_dash(Some(&matter.category))),
        kv(&ui, "Stage", matter.stage.label()),
        kv(&ui, "Priority", &matter.priority.to_string()),
        kv(&ui, "Opened", &format_date(&matter.opened_on)),
        kv(&ui, "Stage Entered", &format_optional_date(matter.stage_entered_on.as_ref())),
        kv(&ui, "Submitted", &format_optional_date(matter.submitted_on.as_ref())),
        kv(&ui, "Completed", &format_optional_date(matter.completed_on.as_ref())),
        kv(&ui, "Assignee", &or_dash(matter.assignee.as_deref())),
        kv(&ui, "Days In Process", &days.days_in_process.to_string()),
        kv(&ui, "Days In Stage", &days.days_in_stage.to_string()),
        kv(
            &ui,
            "Days Since Submission",
            &days
                .days_since_submission
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        kv(&ui, "SLA", &status_cell(&ui, evaluation.status)),
        kv(&ui, "Days Remaining", &evaluation.days_remaining.to_string()),
    ];
    for line in lines {
        print(&ui, &line);
    }
    if let Some(notes) = matter.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        blank_line(&ui);
        print(&ui, &kv(&ui, "Notes", notes));
    }
    Ok(())
}

fn handle_update(ctx: &AppContext, args: &MatterUpdateArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let on = parse_optional_date(args.on.as_deref(), today)?.unwrap_or(today);

    let mut store = ctx.open_store()?;
    let mut stored = find_record::<Matter>(&store.storage, &store.session, &args.id, LIST_HINT)?;
    let matter = &mut stored.record;

    if let Some(client) = args.client.as_deref() {
        matter.client = client.trim().to_string();
    }
    if let Some(category) = args.category.as_deref() {
        matter.category = category.trim().to_string();
    }
    if let Some(priority) = args.priority.as_deref() {
        matter.priority = parse_choice(priority)?;
    }
    if let Some(assignee) = args.assignee.as_deref() {
        matter.assignee = Some(assignee.to_string()).filter(|a| !a.trim().is_empty());
    }
    if let Some(notes) = args.notes.as_deref() {
        matter.notes = Some(notes.to_string()).filter(|n| !n.trim().is_empty());
    }
    if let Some(stage) = args.stage.as_deref() {
        let stage: MatterStage = parse_choice(stage)?;
        matter.advance_to(stage, on);
    }

    store.storage.update(&store.session, &stored.id, &stored.record)?;
    store.close()?;

    let id = stored.id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Updated matter",
        &[("ID", &id), ("Stage", stored.record.stage.label())],
    );
    Ok(())
}

fn handle_complete(ctx: &AppContext, id: &str, on: Option<&str>) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let on = parse_optional_date(on, today)?.unwrap_or(today);

    let mut store = ctx.open_store()?;
    let mut stored = find_record::<Matter>(&store.storage, &store.session, id, LIST_HINT)?;
    if let Some(done) = stored.record.completed_on {
        return Err(CliError::invalid_input(format!(
            "Matter {} was already completed on {}",
            stored.record.reference,
            format_date(&done)
        ))
        .into());
    }
    stored.record.completed_on = Some(on);
    store.storage.update(&store.session, &stored.id, &stored.record)?;
    store.close()?;

    let evaluation = sla::evaluate(&stored.record, &ctx.sla_config()?, today);
    let id = stored.id.to_string();
    let completed = format_date(&on);
    print_receipt(
        &ui,
        ctx.quiet(),
        "Completed matter",
        &[
            ("ID", &id),
            ("Completed", &completed),
            ("SLA", evaluation.status.label()),
        ],
    );
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<Matter>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::Matter, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "matter", &stored.id);
    Ok(())
}

fn handle_sla(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let config = ctx.sla_config()?;
    let store = ctx.open_store()?;
    let matters = store.storage.list::<Matter>(&store.session, &RecordFilter::new())?;
    let rows = evaluated(matters, &config, today);
    let counts = sla::status_counts(rows.iter().map(|(_, e)| e));

    if ui.mode.is_json() {
        let thresholds: serde_json::Map<String, serde_json::Value> = MatterStage::ALL
            .iter()
            .map(|stage| {
                serde_json::to_value(config.thresholds_for(*stage))
                    .map(|value| (stage.key().to_string(), value))
            })
            .collect::<Result<_, _>>()?;
        return print_json(&serde_json::json!({
            "today": today,
            "counts": counts,
            "thresholds": thresholds,
        }));
    }

    print_header(ctx, &ui, "matter sla", Some(&format_date(&today)));
    print(&ui, &section(&ui, "Status"));
    let count_rows: Vec<Vec<String>> = SlaStatus::ALL
        .iter()
        .map(|status| {
            vec![
                status_cell(&ui, *status),
                counts.get(status).copied().unwrap_or(0).to_string(),
            ]
        })
        .collect();
    print(&ui, &simple_table(&ui, &columns(&["Status", "Matters"]), &count_rows));

    blank_line(&ui);
    print(&ui, &section(&ui, "Thresholds"));
    let threshold_rows: Vec<Vec<String>> = MatterStage::ALL
        .iter()
        .map(|stage| {
            let t = config.thresholds_for(*stage);
            let name = if ui.mode.is_pretty() {
                stage.label().to_string()
            } else {
                stage.key().to_string()
            };
            vec![
                name,
                t.at_risk_days.to_string(),
                t.critical_days.to_string(),
                t.limit_days.to_string(),
            ]
        })
        .collect();
    print(
        &ui,
        &table(
            &ui,
            &columns(&["Stage", "At Risk", "Critical", "Limit"]),
            &threshold_rows,
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key_is_snake_case() {
        assert_eq!(status_key(SlaStatus::WithinSla), "within_sla");
        assert_eq!(status_key(SlaStatus::CompletedOverdue), "completed_overdue");
    }
}
