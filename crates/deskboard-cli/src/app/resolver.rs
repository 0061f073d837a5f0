//! Path resolution for config and store files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, DeskboardConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking DESKBOARD_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("DESKBOARD_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file if one exists.
pub fn load_config() -> anyhow::Result<Option<DeskboardConfig>> {
    let path = resolve_config_path()?;
    if !path.exists() {
        log::debug!("no config at {}", path.display());
        return Ok(None);
    }
    log::debug!("reading config {}", path.display());
    read_config(&path).map(Some)
}

/// Resolve the store path from CLI args or config.
pub fn resolve_store_path(
    cli: &Cli,
    config: Option<&DeskboardConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.store.as_deref() {
        return Ok(PathBuf::from(path));
    }
    match config {
        Some(config) => Ok(PathBuf::from(&config.store.path)),
        None => {
            let config_path = resolve_config_path()?;
            Err(CliError::not_found(
                format!("No config found at {}", config_path.display()),
                init_hint(),
            )
            .into())
        }
    }
}

/// Error for a store file that does not exist.
pub fn missing_store_error(path: &Path) -> CliError {
    CliError::not_found(format!("No store found at {}", path.display()), init_hint())
}

fn init_hint() -> &'static str {
    "Hint: Run `deskboard init`, or point at a store with --store / DESKBOARD_PATH."
}
