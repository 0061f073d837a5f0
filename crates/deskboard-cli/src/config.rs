use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use deskboard_core::leave::LeaveType;
use deskboard_core::matter::MatterStage;
use deskboard_core::sla::{SlaConfig, StageThresholds};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeskboardConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub ui: UiSection,
    #[serde(default, skip_serializing_if = "SlaSection::is_empty")]
    pub sla: SlaSection,
    #[serde(default, skip_serializing_if = "LeaveSection::is_empty")]
    pub leave: LeaveSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SessionSection {
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UiSection {
    pub timezone: Option<String>,
}

/// SLA overrides. Stage keys use the stage names (`intake`, `under_review`, ...).
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SlaSection {
    pub default: Option<StageThresholds>,
    #[serde(default)]
    pub stages: BTreeMap<String, StageThresholds>,
}

impl SlaSection {
    fn is_empty(&self) -> bool {
        self.default.is_none() && self.stages.is_empty()
    }

    /// Merge the overrides onto the built-in thresholds.
    pub fn resolve(&self) -> anyhow::Result<SlaConfig> {
        let mut config = SlaConfig::default();
        if let Some(default) = self.default {
            config.default = default;
        }
        for (name, thresholds) in &self.stages {
            let stage: MatterStage = name
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid [sla.stages] key: {}", e))?;
            config.stages.insert(stage, *thresholds);
        }
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [sla] config: {}", e))?;
        Ok(config)
    }
}

/// Yearly leave allowances in days, keyed by leave type name.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct LeaveSection {
    #[serde(default)]
    pub allowances: BTreeMap<String, f64>,
}

impl LeaveSection {
    fn is_empty(&self) -> bool {
        self.allowances.is_empty()
    }

    pub fn resolve(&self) -> anyhow::Result<BTreeMap<LeaveType, f64>> {
        let mut allowances = BTreeMap::new();
        for (name, days) in &self.allowances {
            let leave_type: LeaveType = name
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid [leave.allowances] key: {}", e))?;
            if !days.is_finite() || *days < 0.0 {
                return Err(anyhow::anyhow!(
                    "Leave allowance for {} must be a non-negative number of days",
                    name
                ));
            }
            allowances.insert(leave_type, *days);
        }
        Ok(allowances)
    }
}

impl DeskboardConfig {
    pub fn new(store_path: PathBuf, user: Option<String>, timezone: Option<String>) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            session: SessionSection { user },
            ui: UiSection { timezone },
            sla: SlaSection::default(),
            leave: LeaveSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("deskboard.desk"))
}

pub fn read_config(path: &Path) -> anyhow::Result<DeskboardConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &DeskboardConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    deskboard_core::fs::write_atomic(path, contents.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("deskboard"));
        }
    }
    Ok(home_dir()?.join(".config").join("deskboard"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("deskboard"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("deskboard"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
