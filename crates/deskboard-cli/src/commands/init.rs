use std::path::PathBuf;

use deskboard_core::crypto::validate_passphrase;
use deskboard_core::storage::AgeSqliteStorage;
use deskboard_core::StorageEngine;

use crate::app::{parse_timezone, resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, DeskboardConfig};
use crate::errors::CliError;
use crate::helpers::prompt_new_passphrase;
use crate::output::print_receipt;
use crate::ui::hint;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false, None);

    let store_path = match args.path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => default_store_path()?,
    };
    let config_path = match args.config_path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => resolve_config_path()?,
    };

    if store_path.exists() {
        return Err(CliError::invalid_input(format!(
            "Store already exists at {}",
            store_path.display()
        ))
        .into());
    }
    if config_path.exists() {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Remove it or pass --config-path.",
            config_path.display()
        ))
        .into());
    }

    let timezone = args
        .timezone
        .as_deref()
        .map(|name| parse_timezone(name).map(|tz| tz.name().to_string()))
        .transpose()?;
    let user_name = ctx
        .cli()
        .user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "me".to_string());

    let passphrase = prompt_new_passphrase(ctx.interactive())?;
    validate_passphrase(&passphrase).map_err(|e| CliError::invalid_input(e.to_string()))?;

    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e)
            })?;
        }
    }

    let store_id = AgeSqliteStorage::create(&store_path, &passphrase)?;
    let mut storage = AgeSqliteStorage::open(&store_path, &passphrase)?;
    let user = storage.create_user(&user_name)?;
    storage.close(&passphrase)?;

    let config = DeskboardConfig::new(store_path.clone(), Some(user.name.clone()), timezone);
    write_config(&config_path, &config)?;
    log::debug!("wrote config to {}", config_path.display());

    let store_display = store_path.display().to_string();
    let config_display = config_path.display().to_string();
    let store_id = store_id.to_string();
    print_receipt(
        &ui,
        ctx.quiet(),
        "Store created",
        &[
            ("Store", &store_display),
            ("Config", &config_display),
            ("User", &user.name),
            ("Store ID", &store_id),
        ],
    );
    if !ctx.quiet() && ui.mode.is_pretty() {
        println!();
        println!("{}", hint(&ui, "Open your first matter with `deskboard matter add <REF> <CLIENT>`."));
    }
    Ok(())
}
