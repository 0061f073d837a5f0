use deskboard_core::note::Note;
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{NoteCommand, OutputArgs};
use crate::constants::DEFAULT_LIST_LIMIT;
use crate::errors::CliError;
use crate::helpers::{find_record, read_body};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::{blank_line, columns, format_datetime, kv, print, simple_table, UiContext};

use super::{display_id, or_dash, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard note list` to find note IDs.";
const PREVIEW_CHARS: usize = 60;

pub fn handle(ctx: &AppContext, command: &NoteCommand) -> anyhow::Result<()> {
    match command {
        NoteCommand::Add {
            title,
            body,
            tag,
            pin,
        } => handle_add(ctx, title, body.as_deref(), tag, *pin),
        NoteCommand::List {
            tag,
            pinned,
            limit,
            output,
        } => handle_list(ctx, tag.as_deref(), *pinned, *limit, output),
        NoteCommand::Show { id, output } => handle_show(ctx, id, output),
        NoteCommand::Search { query, output } => handle_search(ctx, query, output),
        NoteCommand::Delete { id } => handle_delete(ctx, id),
    }
}

fn handle_add(
    ctx: &AppContext,
    title: &str,
    body: Option<&str>,
    tags: &[String],
    pin: bool,
) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let body = read_body(body)?;
    let mut note = Note::new(title, body, tags).map_err(|e| CliError::invalid_input(e.to_string()))?;
    note.pinned = pin;

    let mut store = ctx.open_store()?;
    let id = store.storage.insert(&store.session, &note)?;
    store.close()?;

    let id = id.to_string();
    let tags = or_dash(Some(&note.tags.join(",")));
    print_receipt(
        &ui,
        ctx.quiet(),
        "Saved note",
        &[("ID", &id), ("Title", &note.title), ("Tags", &tags)],
    );
    Ok(())
}

fn note_json(stored: &Stored<Note>) -> anyhow::Result<serde_json::Value> {
    record_json(
        stored,
        serde_json::json!({ "preview": stored.record.preview(PREVIEW_CHARS) }),
    )
}

fn print_notes(
    ctx: &AppContext,
    ui: &UiContext,
    command: &str,
    notes: &[Stored<Note>],
) -> anyhow::Result<()> {
    if ui.mode.is_json() {
        let values = notes
            .iter()
            .map(note_json)
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let tz = ctx.timezone()?;
    let rows: Vec<Vec<String>> = notes
        .iter()
        .map(|n| {
            let pin = if n.record.pinned { "*" } else { "" };
            vec![
                display_id(ui, &n.id),
                format_datetime(&n.created_at, tz, ui.mode.is_pretty()),
                format!("{}{}", pin, n.record.title),
                or_dash(Some(&n.record.tags.join(","))),
                n.record.preview(PREVIEW_CHARS),
            ]
        })
        .collect();

    print_header(ctx, ui, command, Some(&notes.len().to_string()));
    print(
        ui,
        &simple_table(
            ui,
            &columns(&["ID", "Created", "Title", "Tags", "Preview"]),
            &rows,
        ),
    );
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    tag: Option<&str>,
    pinned: bool,
    limit: Option<usize>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let tag = tag.map(|t| t.trim().to_lowercase());

    let store = ctx.open_store()?;
    let mut notes: Vec<Stored<Note>> = store
        .storage
        .list::<Note>(&store.session, &RecordFilter::new())?
        .into_iter()
        .filter(|n| tag.as_ref().map_or(true, |t| n.record.tags.contains(t)))
        .filter(|n| !pinned || n.record.pinned)
        .collect();
    // Stable sort keeps newest-first order within each group
    notes.sort_by_key(|n| !n.record.pinned);
    notes.truncate(limit.unwrap_or(DEFAULT_LIST_LIMIT));

    print_notes(ctx, &ui, "note list", &notes)
}

fn handle_show(ctx: &AppContext, id: &str, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let store = ctx.open_store()?;
    let stored = find_record::<Note>(&store.storage, &store.session, id, LIST_HINT)?;

    if ui.mode.is_json() {
        return print_json(&note_json(&stored)?);
    }

    let tz = ctx.timezone()?;
    let note = &stored.record;
    print_header(ctx, &ui, "note show", Some(&note.title));
    print(&ui, &kv(&ui, "ID", &stored.id.to_string()));
    print(&ui, &kv(&ui, "Title", &note.title));
    print(
        &ui,
        &kv(&ui, "Created", &format_datetime(&stored.created_at, tz, ui.mode.is_pretty())),
    );
    print(&ui, &kv(&ui, "Tags", &or_dash(Some(&note.tags.join(", ")))));
    print(&ui, &kv(&ui, "Pinned", if note.pinned { "yes" } else { "no" }));
    if !note.body.is_empty() {
        blank_line(&ui);
        if ui.mode.is_pretty() {
            println!("{}", note.body);
        } else {
            print(&ui, "---");
            println!("{}", note.body);
        }
    }
    Ok(())
}

fn handle_search(ctx: &AppContext, query: &str, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let store = ctx.open_store()?;
    let notes = store
        .storage
        .search(&store.session, query, Some(RecordKind::Note))?
        .iter()
        .map(|envelope| envelope.decode::<Note>())
        .collect::<deskboard_core::Result<Vec<_>>>()?;

    print_notes(ctx, &ui, "note search", &notes)
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<Note>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::Note, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "note", &stored.id);
    Ok(())
}
