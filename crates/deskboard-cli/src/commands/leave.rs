use chrono::Datelike;

use deskboard_core::leave::{Leave, LeaveStatus, LeaveSummary, LeaveType};
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{LeaveAddArgs, LeaveCommand, LeaveUpdateArgs, OutputArgs};
use crate::helpers::{find_record, parse_choice, parse_date};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::{columns, format_date, format_days, print, simple_table, table};

use super::{display_id, or_dash, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard leave list` to find leave IDs.";

pub fn handle(ctx: &AppContext, command: &LeaveCommand) -> anyhow::Result<()> {
    match command {
        LeaveCommand::Add(args) => handle_add(ctx, args),
        LeaveCommand::List {
            year,
            status,
            output,
        } => handle_list(ctx, *year, status.as_deref(), output),
        LeaveCommand::Update(args) => handle_update(ctx, args),
        LeaveCommand::Delete { id } => handle_delete(ctx, id),
        LeaveCommand::Summary { year, output } => handle_summary(ctx, *year, output),
    }
}

/// Log a warning for each active leave that overlaps `leave`.
fn warn_overlaps(leave: &Leave, existing: &[Stored<Leave>], skip: Option<&uuid::Uuid>) {
    for other in existing {
        if skip == Some(&other.id) || !leave.overlaps(&other.record) {
            continue;
        }
        log::warn!(
            "leave {} to {} overlaps existing leave {} ({} to {})",
            format_date(&leave.start_date),
            format_date(&leave.end_date),
            other.id,
            format_date(&other.record.start_date),
            format_date(&other.record.end_date)
        );
    }
}

fn handle_add(ctx: &AppContext, args: &LeaveAddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let leave_type: LeaveType = parse_choice(&args.leave_type)?;
    let start = parse_date(&args.start, today)?;
    let end = match args.end.as_deref() {
        Some(value) => parse_date(value, today)?,
        None => start,
    };

    let mut leave = Leave::new(leave_type, start, end);
    leave.half_day = args.half_day;
    leave.status = parse_choice(&args.status)?;
    leave.reason = args.reason.clone().filter(|r| !r.trim().is_empty());

    let mut store = ctx.open_store()?;
    let existing = store.storage.list::<Leave>(&store.session, &RecordFilter::new())?;
    warn_overlaps(&leave, &existing, None);
    let id = store.storage.insert(&store.session, &leave)?;
    store.close()?;

    let id = id.to_string();
    let days = format_days(leave.working_days());
    print_receipt(
        &ui,
        ctx.quiet(),
        "Recorded leave",
        &[
            ("ID", &id),
            ("Type", &leave.leave_type.to_string()),
            ("Working Days", &days),
            ("Status", &leave.status.to_string()),
        ],
    );
    Ok(())
}

fn touches_year(leave: &Leave, year: i32) -> bool {
    leave.start_date.year() <= year && leave.end_date.year() >= year
}

fn handle_list(
    ctx: &AppContext,
    year: Option<i32>,
    status: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let status = status.map(parse_choice::<LeaveStatus>).transpose()?;

    let store = ctx.open_store()?;
    let mut leaves: Vec<Stored<Leave>> = store
        .storage
        .list::<Leave>(&store.session, &RecordFilter::new())?
        .into_iter()
        .filter(|l| year.map_or(true, |y| touches_year(&l.record, y)))
        .filter(|l| status.map_or(true, |s| l.record.status == s))
        .collect();
    leaves.sort_by(|a, b| b.record.start_date.cmp(&a.record.start_date));

    if ui.mode.is_json() {
        let values = leaves
            .iter()
            .map(|l| {
                record_json(
                    l,
                    serde_json::json!({ "working_days": l.record.working_days() }),
                )
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let rows: Vec<Vec<String>> = leaves
        .iter()
        .map(|l| {
            vec![
                display_id(&ui, &l.id),
                l.record.leave_type.to_string(),
                format_date(&l.record.start_date),
                format_date(&l.record.end_date),
                format_days(l.record.working_days()),
                l.record.status.to_string(),
                or_dash(l.record.reason.as_deref()),
            ]
        })
        .collect();

    print_header(ctx, &ui, "leave list", Some(&leaves.len().to_string()));
    print(
        &ui,
        &simple_table(
            &ui,
            &columns(&["ID", "Type", "Start", "End", "Days", "Status", "Reason"]),
            &rows,
        ),
    );
    Ok(())
}

fn handle_update(ctx: &AppContext, args: &LeaveUpdateArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;

    let mut store = ctx.open_store()?;
    let mut stored = find_record::<Leave>(&store.storage, &store.session, &args.id, LIST_HINT)?;
    let leave = &mut stored.record;

    if let Some(status) = args.status.as_deref() {
        leave.status = parse_choice(status)?;
    }
    if let Some(leave_type) = args.leave_type.as_deref() {
        leave.leave_type = parse_choice(leave_type)?;
    }
    if let Some(start) = args.start.as_deref() {
        leave.start_date = parse_date(start, today)?;
    }
    if let Some(end) = args.end.as_deref() {
        leave.end_date = parse_date(end, today)?;
    }
    if let Some(reason) = args.reason.as_deref() {
        leave.reason = Some(reason.to_string()).filter(|r| !r.trim().is_empty());
    }

    let existing = store.storage.list::<Leave>(&store.session, &RecordFilter::new())?;
    warn_overlaps(&stored.record, &existing, Some(&stored.id));
    store.storage.update(&store.session, &stored.id, &stored.record)?;
    store.close()?;

    let id = stored.id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Updated leave",
        &[("ID", &id), ("Status", &stored.record.status.to_string())],
    );
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<Leave>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::Leave, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "leave", &stored.id);
    Ok(())
}

fn handle_summary(ctx: &AppContext, year: Option<i32>, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let year = match year {
        Some(year) => year,
        None => ctx.today()?.year(),
    };
    let allowances = ctx.leave_allowances()?;

    let store = ctx.open_store()?;
    let leaves = store.storage.list::<Leave>(&store.session, &RecordFilter::new())?;
    let summary = LeaveSummary::for_year(leaves.iter().map(|l| &l.record), year, &allowances);

    if ui.mode.is_json() {
        return print_json(&summary);
    }

    let optional = |value: Option<f64>| value.map(format_days).unwrap_or_else(|| "-".to_string());
    let rows: Vec<Vec<String>> = summary
        .balances
        .iter()
        .map(|b| {
            vec![
                b.leave_type.to_string(),
                format_days(b.taken),
                format_days(b.pending),
                optional(b.allowance),
                optional(b.remaining),
            ]
        })
        .collect();

    print_header(ctx, &ui, "leave summary", Some(&year.to_string()));
    print(
        &ui,
        &table(
            &ui,
            &columns(&["Type", "Taken", "Pending", "Allowance", "Remaining"]),
            &rows,
        ),
    );
    Ok(())
}
