use chrono::Duration;

use deskboard_core::meeting::{self, Meeting, MAX_DURATION_MINUTES};
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{MeetingAddArgs, MeetingCommand, OutputArgs};
use crate::errors::CliError;
use crate::helpers::{find_record, parse_datetime, parse_minutes, parse_window_days};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::{columns, format_datetime, print, simple_table, UiContext};

use super::{display_id, or_dash, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard meeting list --all` to find meeting IDs.";

pub fn handle(ctx: &AppContext, command: &MeetingCommand) -> anyhow::Result<()> {
    match command {
        MeetingCommand::Add(args) => handle_add(ctx, args),
        MeetingCommand::List { all, output } => handle_list(ctx, *all, output),
        MeetingCommand::Upcoming { within, output } => handle_upcoming(ctx, within, output),
        MeetingCommand::Cancel { id } => handle_cancel(ctx, id),
        MeetingCommand::Delete { id } => handle_delete(ctx, id),
    }
}

fn handle_add(ctx: &AppContext, args: &MeetingAddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let tz = ctx.timezone()?;
    let starts_at = parse_datetime(&args.at, tz)?;
    let minutes = parse_minutes(&args.duration)?;
    if minutes == 0 || minutes > MAX_DURATION_MINUTES {
        return Err(CliError::invalid_input(format!(
            "Duration must be between 1 minute and {} hours",
            MAX_DURATION_MINUTES / 60
        ))
        .into());
    }

    let mut meeting = Meeting::new(args.title.trim(), starts_at, minutes);
    meeting.location = args.location.clone().filter(|l| !l.trim().is_empty());
    meeting.attendees = args
        .attendees
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    meeting.agenda = args.agenda.clone().filter(|a| !a.trim().is_empty());

    let mut store = ctx.open_store()?;
    let existing = store.storage.list::<Meeting>(&store.session, &RecordFilter::new())?;
    for other in existing.iter().filter(|m| meeting.overlaps(&m.record)) {
        log::warn!(
            "meeting \"{}\" conflicts with \"{}\" ({})",
            meeting.title,
            other.record.title,
            other.id
        );
    }
    let id = store.storage.insert(&store.session, &meeting)?;
    store.close()?;

    let id = id.to_string();
    let starts = format_datetime(&meeting.starts_at, tz, ui.mode.is_pretty());
    let length = format!("{}m", meeting.duration_minutes);
    print_receipt(
        &ui,
        ctx.quiet(),
        "Scheduled meeting",
        &[("ID", &id), ("Starts", &starts), ("Duration", &length)],
    );
    Ok(())
}

fn print_meetings(
    ctx: &AppContext,
    ui: &UiContext,
    command: &str,
    meetings: &[&Stored<Meeting>],
    conflicting: &[uuid::Uuid],
) -> anyhow::Result<()> {
    if ui.mode.is_json() {
        let values = meetings
            .iter()
            .map(|m| {
                record_json(
                    m,
                    serde_json::json!({
                        "ends_at": m.record.ends_at(),
                        "conflict": conflicting.contains(&m.id),
                    }),
                )
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let tz = ctx.timezone()?;
    let pretty = ui.mode.is_pretty();
    let rows: Vec<Vec<String>> = meetings
        .iter()
        .map(|m| {
            let mut flags = Vec::new();
            if m.record.cancelled {
                flags.push("cancelled");
            }
            if conflicting.contains(&m.id) {
                flags.push("conflict");
            }
            vec![
                display_id(ui, &m.id),
                format_datetime(&m.record.starts_at, tz, pretty),
                format!("{}m", m.record.duration_minutes),
                m.record.title.clone(),
                or_dash(m.record.location.as_deref()),
                or_dash(Some(&flags.join(","))),
            ]
        })
        .collect();

    print_header(ctx, ui, command, Some(&meetings.len().to_string()));
    print(
        ui,
        &simple_table(
            ui,
            &columns(&["ID", "Starts", "Length", "Title", "Location", "Flags"]),
            &rows,
        ),
    );
    Ok(())
}

/// IDs of meetings that overlap another meeting in the list.
fn conflicting_ids(meetings: &[&Stored<Meeting>]) -> Vec<uuid::Uuid> {
    let mut ids = Vec::new();
    for (a, b) in meeting::conflicts(meetings, |m: &&Stored<Meeting>| &m.record) {
        ids.push(meetings[a].id);
        ids.push(meetings[b].id);
    }
    ids.sort();
    ids.dedup();
    ids
}

fn handle_list(ctx: &AppContext, all: bool, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let now = ctx.now()?;
    let store = ctx.open_store()?;
    let meetings = store.storage.list::<Meeting>(&store.session, &RecordFilter::new())?;

    let mut shown: Vec<&Stored<Meeting>> = meetings
        .iter()
        .filter(|m| all || (!m.record.cancelled && m.record.ends_at() > now))
        .collect();
    shown.sort_by_key(|m| m.record.starts_at);
    let conflicting = conflicting_ids(&shown);

    print_meetings(ctx, &ui, "meeting list", &shown, &conflicting)
}

fn handle_upcoming(ctx: &AppContext, within: &str, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let days = parse_window_days(within)?;
    let now = ctx.now()?;
    let store = ctx.open_store()?;
    let meetings = store.storage.list::<Meeting>(&store.session, &RecordFilter::new())?;

    let soon = meeting::upcoming(&meetings, now, Duration::days(days), |m: &Stored<Meeting>| {
        &m.record
    });
    let conflicting = conflicting_ids(&soon);

    print_meetings(ctx, &ui, "meeting upcoming", &soon, &conflicting)
}

fn handle_cancel(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let mut stored = find_record::<Meeting>(&store.storage, &store.session, id, LIST_HINT)?;
    if stored.record.cancelled {
        return Err(CliError::invalid_input(format!(
            "Meeting \"{}\" is already cancelled",
            stored.record.title
        ))
        .into());
    }
    stored.record.cancelled = true;
    store.storage.update(&store.session, &stored.id, &stored.record)?;
    store.close()?;

    let id = stored.id.to_string();
    print_receipt(&ui, ctx.quiet(), "Cancelled meeting", &[("ID", &id)]);
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<Meeting>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::Meeting, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "meeting", &stored.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn stored(title: &str, at: &str, minutes: u32) -> Stored<Meeting> {
        let starts_at = DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc);
        Stored {
            id: uuid::Uuid::new_v4(),
            owner_id: uuid::Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            record: Meeting::new(title, starts_at, minutes),
        }
    }

    #[test]
    fn test_conflicting_ids_marks_both_sides() {
        let a = stored("Standup", "2025-03-03T09:00:00Z", 30);
        let b = stored("Review", "2025-03-03T09:15:00Z", 30);
        let c = stored("Lunch", "2025-03-03T12:00:00Z", 60);
        let ids = conflicting_ids(&[&a, &b, &c]);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }
}
