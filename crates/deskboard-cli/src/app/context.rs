//! Application context for the Deskboard CLI.
//!
//! Combines CLI arguments with the lazily-loaded config file and derives
//! the values every command needs: output mode, timezone, "today" and
//! the acting user.

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::unsync::OnceCell;

use deskboard_core::leave::LeaveType;
use deskboard_core::sla::SlaConfig;
use deskboard_core::storage::AgeSqliteStorage;

use crate::cli::{Cli, OutputArgs};
use crate::config::DeskboardConfig;
use crate::errors::CliError;
use crate::ui::{FormatFlag, UiContext};

use super::passphrase::open_storage_with_retry;
use super::resolver::{load_config, resolve_store_path};
use super::store::OpenStore;

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<DeskboardConfig>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts may be shown.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && std::io::stdin().is_terminal()
    }

    /// The config file, loaded on first use. `None` when there is no file.
    pub fn config(&self) -> anyhow::Result<Option<&DeskboardConfig>> {
        Ok(self.config.get_or_try_init(load_config)?.as_ref())
    }

    /// Build a UI context from per-command output flags.
    pub fn ui_context(&self, json: bool, format: Option<FormatFlag>) -> UiContext {
        UiContext::from_env(json, format, self.cli.no_color, self.cli.ascii)
    }

    pub fn ui(&self, output: &OutputArgs) -> UiContext {
        self.ui_context(output.json, output.format)
    }

    /// Timezone for dates and wall-clock input (UTC unless configured).
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        let name = self
            .config()?
            .and_then(|config| config.ui.timezone.as_deref());
        match name {
            Some(name) => parse_timezone(name),
            None => Ok(Tz::UTC),
        }
    }

    /// The calendar date used for SLA and balance calculations.
    pub fn today(&self) -> anyhow::Result<NaiveDate> {
        if let Some(value) = self.cli.today.as_deref() {
            return NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::invalid_input(format!("Invalid --today (expected YYYY-MM-DD): {}", value))
                    .into()
            });
        }
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }

    /// The current instant. With `--today`, the start of that day.
    pub fn now(&self) -> anyhow::Result<DateTime<Utc>> {
        if self.cli.today.is_none() {
            return Ok(Utc::now());
        }
        let tz = self.timezone()?;
        let midnight = self
            .today()?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid --today value"))?;
        tz.from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| anyhow::anyhow!("Midnight does not exist in {}", tz.name()))
    }

    pub fn sla_config(&self) -> anyhow::Result<SlaConfig> {
        match self.config()? {
            Some(config) => config.sla.resolve(),
            None => Ok(SlaConfig::default()),
        }
    }

    pub fn leave_allowances(&self) -> anyhow::Result<BTreeMap<LeaveType, f64>> {
        match self.config()? {
            Some(config) => config.leave.resolve(),
            None => Ok(BTreeMap::new()),
        }
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        resolve_store_path(self.cli, self.config()?)
    }

    /// Open the store without choosing a user.
    pub fn open_storage(&self) -> anyhow::Result<(AgeSqliteStorage, String)> {
        open_storage_with_retry(&self.store_path()?, self.interactive())
    }

    /// Open the store and resolve the acting user.
    pub fn open_store(&self) -> anyhow::Result<OpenStore> {
        let (storage, passphrase) = self.open_storage()?;
        let preferred = match self.cli.user.as_deref() {
            Some(name) => Some(name.to_string()),
            None => self
                .config()?
                .and_then(|config| config.session.user.clone()),
        };
        OpenStore::new(storage, passphrase, preferred.as_deref())
    }
}

pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
    name.trim().parse::<Tz>().map_err(|_| {
        CliError::invalid_input(format!("Unknown timezone: {} (use an IANA name)", name)).into()
    })
}
