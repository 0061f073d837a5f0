//! Commands that work across record kinds: search and export.

use deskboard_core::storage::RecordEnvelope;
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{ExportFormat, OutputArgs};
use crate::helpers::parse_choice;
use crate::output::{envelope_json, print_json};
use crate::ui::format::single_line;
use crate::ui::{columns, print, simple_table, truncate};

use super::{display_id, print_header};

const SUMMARY_CHARS: usize = 60;

/// One-line description of a record for mixed-kind listings.
fn envelope_summary(envelope: &RecordEnvelope) -> String {
    let field = |name: &str| envelope.data.get(name).and_then(|v| v.as_str());
    let text = match envelope.kind {
        RecordKind::Matter => format!(
            "{} ({})",
            field("reference").unwrap_or_default(),
            field("client").unwrap_or_default()
        ),
        RecordKind::Note | RecordKind::Meeting | RecordKind::WorkflowTask => {
            field("title").unwrap_or_default().to_string()
        }
        RecordKind::Project | RecordKind::WorkflowStep => {
            field("name").unwrap_or_default().to_string()
        }
        RecordKind::NetWorth => field("label").unwrap_or_default().to_string(),
        RecordKind::Leave => format!(
            "{} {} to {}",
            field("leave_type").unwrap_or_default(),
            field("start_date").unwrap_or_default(),
            field("end_date").unwrap_or_default()
        ),
        RecordKind::GtciScore => format!(
            "{} {}",
            field("country").unwrap_or_default(),
            envelope.data.get("year").map(|v| v.to_string()).unwrap_or_default()
        ),
    };
    truncate(&single_line(&text), SUMMARY_CHARS)
}

pub fn handle_search(
    ctx: &AppContext,
    query: &str,
    kind: Option<&str>,
    limit: Option<usize>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let kind = kind.map(parse_choice::<RecordKind>).transpose()?;

    let store = ctx.open_store()?;
    let mut results = store.storage.search(&store.session, query, kind)?;
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    if ui.mode.is_json() {
        let values: Vec<serde_json::Value> = results.iter().map(envelope_json).collect();
        return print_json(&values);
    }

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|e| vec![display_id(&ui, &e.id), e.kind.to_string(), envelope_summary(e)])
        .collect();
    print_header(ctx, &ui, "search", Some(query));
    print(&ui, &simple_table(&ui, &columns(&["ID", "Kind", "Summary"]), &rows));
    Ok(())
}

pub fn handle_export(
    ctx: &AppContext,
    format: ExportFormat,
    kind: Option<&str>,
) -> anyhow::Result<()> {
    let kind = kind.map(parse_choice::<RecordKind>).transpose()?;

    let store = ctx.open_store()?;
    let records: Vec<serde_json::Value> = store
        .storage
        .export(&store.session)?
        .iter()
        .filter(|e| kind.map_or(true, |k| e.kind == k))
        .map(envelope_json)
        .collect();

    match format {
        ExportFormat::Json => print_json(&records)?,
        ExportFormat::Jsonl => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}
