use deskboard_core::StorageEngine;

use crate::app::AppContext;
use crate::cli::{OutputArgs, UserCommand};
use crate::output::{print_json, print_receipt};
use crate::ui::{columns, format_datetime, print, simple_table};

use super::{display_id, print_header};

pub fn handle(ctx: &AppContext, command: &UserCommand) -> anyhow::Result<()> {
    match command {
        UserCommand::Add { name } => handle_add(ctx, name),
        UserCommand::List(output) => handle_list(ctx, output),
    }
}

fn handle_add(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);
    let (mut storage, passphrase) = ctx.open_storage()?;
    let user = storage.create_user(name)?;
    storage.close(&passphrase)?;

    let id = user.id.to_string();
    print_receipt(&ui, ctx.quiet(), "Added user", &[("Name", &user.name), ("ID", &id)]);
    Ok(())
}

fn handle_list(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(output);
    let (storage, _passphrase) = ctx.open_storage()?;
    let users = storage.list_users()?;

    if ui.mode.is_json() {
        return print_json(&users);
    }

    let tz = ctx.timezone()?;
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|user| {
            vec![
                display_id(&ui, &user.id),
                user.name.clone(),
                format_datetime(&user.created_at, tz, ui.mode.is_pretty()),
            ]
        })
        .collect();

    print_header(ctx, &ui, "user list", Some(&users.len().to_string()));
    print(&ui, &simple_table(&ui, &columns(&["ID", "Name", "Created"]), &rows));
    Ok(())
}
