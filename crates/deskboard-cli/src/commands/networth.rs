use deskboard_core::money::Money;
use deskboard_core::networth::{self, NetWorthEntry, NetWorthSummary, NetWorthType};
use deskboard_core::storage::{RecordFilter, Stored};
use deskboard_core::{RecordKind, StorageEngine};

use crate::app::AppContext;
use crate::cli::{NetWorthCommand, OutputArgs};
use crate::helpers::{find_record, parse_choice, parse_money, parse_optional_date};
use crate::output::{print_deleted, print_json, print_receipt, record_json};
use crate::ui::theme::{styled, styles};
use crate::ui::{
    blank_line, columns, format_date, kv, print, section, simple_table, table, UiContext,
};

use super::{display_id, print_header};

const LIST_HINT: &str = "Hint: Run `deskboard networth list` to find entry IDs.";

pub fn handle(ctx: &AppContext, command: &NetWorthCommand) -> anyhow::Result<()> {
    match command {
        NetWorthCommand::Add {
            entry_type,
            label,
            amount,
            on,
        } => handle_add(ctx, entry_type, label, amount, on.as_deref()),
        NetWorthCommand::List { entry_type, output } => {
            handle_list(ctx, entry_type.as_deref(), output)
        }
        NetWorthCommand::Summary { as_of, output } => handle_summary(ctx, as_of.as_deref(), output),
        NetWorthCommand::History { months, output } => handle_history(ctx, *months, output),
        NetWorthCommand::Delete { id } => handle_delete(ctx, id),
    }
}

fn handle_add(
    ctx: &AppContext,
    entry_type: &str,
    label: &str,
    amount: &str,
    on: Option<&str>,
) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let today = ctx.today()?;
    let entry_type: NetWorthType = parse_choice(entry_type)?;
    let amount = parse_money(amount)?;
    let logged_on = parse_optional_date(on, today)?.unwrap_or(today);
    let entry = NetWorthEntry::new(entry_type, label, amount, logged_on);

    let mut store = ctx.open_store()?;
    let id = store.storage.insert(&store.session, &entry)?;
    store.close()?;

    let id = id.to_string();
    let amount = entry.amount.to_string();
    let logged = format_date(&entry.logged_on);
    print_receipt(
        &ui,
        ctx.quiet(),
        "Logged balance",
        &[
            ("ID", &id),
            ("Type", &entry.entry_type.to_string()),
            ("Label", &entry.label),
            ("Amount", &amount),
            ("Date", &logged),
        ],
    );
    Ok(())
}

fn load_entries(ctx: &AppContext) -> anyhow::Result<Vec<Stored<NetWorthEntry>>> {
    let store = ctx.open_store()?;
    Ok(store
        .storage
        .list::<NetWorthEntry>(&store.session, &RecordFilter::new())?)
}

fn handle_list(ctx: &AppContext, entry_type: Option<&str>, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let entry_type = entry_type.map(parse_choice::<NetWorthType>).transpose()?;

    let mut entries: Vec<Stored<NetWorthEntry>> = load_entries(ctx)?
        .into_iter()
        .filter(|e| entry_type.map_or(true, |t| e.record.entry_type == t))
        .collect();
    entries.sort_by(|a, b| {
        b.record
            .logged_on
            .cmp(&a.record.logged_on)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    if ui.mode.is_json() {
        let values = entries
            .iter()
            .map(|e| record_json(e, serde_json::Value::Null))
            .collect::<anyhow::Result<Vec<_>>>()?;
        return print_json(&values);
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                display_id(&ui, &e.id),
                format_date(&e.record.logged_on),
                e.record.entry_type.to_string(),
                e.record.label.clone(),
                e.record.amount.to_string(),
            ]
        })
        .collect();

    print_header(ctx, &ui, "networth list", Some(&entries.len().to_string()));
    print(
        &ui,
        &simple_table(&ui, &columns(&["ID", "Date", "Type", "Label", "Amount"]), &rows),
    );
    Ok(())
}

fn money_cell(ui: &UiContext, amount: Money) -> String {
    if amount.is_negative() {
        styled(&amount.to_string(), styles::red(), ui.color)
    } else {
        amount.to_string()
    }
}

/// Totals block shared by the summary and the dashboard.
pub(crate) fn print_totals(ui: &UiContext, summary: &NetWorthSummary) {
    print(ui, &kv(ui, "Assets", &summary.assets.to_string()));
    print(ui, &kv(ui, "Savings", &summary.savings.to_string()));
    print(ui, &kv(ui, "Loans", &summary.loans.to_string()));
    print(ui, &kv(ui, "Net", &money_cell(ui, summary.net)));
}

fn handle_summary(ctx: &AppContext, as_of: Option<&str>, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let as_of = parse_optional_date(as_of, today)?.unwrap_or(today);
    let entries = load_entries(ctx)?;
    let summary = networth::summarize(&entries, Some(as_of));

    if ui.mode.is_json() {
        return print_json(&summary);
    }

    print_header(ctx, &ui, "networth summary", Some(&format_date(&as_of)));
    print(&ui, &section(&ui, "Totals"));
    print_totals(&ui, &summary);
    blank_line(&ui);

    print(&ui, &section(&ui, "Latest Balances"));
    let rows: Vec<Vec<String>> = summary
        .entries
        .iter()
        .map(|line| {
            vec![
                line.entry_type.to_string(),
                line.label.clone(),
                line.amount.to_string(),
                format_date(&line.logged_on),
            ]
        })
        .collect();
    print(
        &ui,
        &table(&ui, &columns(&["Type", "Label", "Amount", "As Of"]), &rows),
    );
    Ok(())
}

fn handle_history(ctx: &AppContext, months: u32, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let today = ctx.today()?;
    let entries = load_entries(ctx)?;
    let dates = networth::month_ends(today, months.max(1));
    let summaries = networth::history(&entries, &dates);

    if ui.mode.is_json() {
        let values: Vec<serde_json::Value> = summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "as_of": s.as_of,
                    "assets": s.assets,
                    "savings": s.savings,
                    "loans": s.loans,
                    "net": s.net,
                })
            })
            .collect();
        return print_json(&values);
    }

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.as_of.as_ref().map(format_date).unwrap_or_default(),
                s.assets.to_string(),
                s.savings.to_string(),
                s.loans.to_string(),
                money_cell(&ui, s.net),
            ]
        })
        .collect();

    print_header(ctx, &ui, "networth history", Some(&format!("{} months", months.max(1))));
    print(
        &ui,
        &table(
            &ui,
            &columns(&["Month End", "Assets", "Savings", "Loans", "Net"]),
            &rows,
        ),
    );
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let mut store = ctx.open_store()?;
    let stored = find_record::<NetWorthEntry>(&store.storage, &store.session, id, LIST_HINT)?;
    store.storage.delete(&store.session, RecordKind::NetWorth, &stored.id)?;
    store.close()?;
    print_deleted(&ui, ctx.quiet(), "balance", &stored.id);
    Ok(())
}
