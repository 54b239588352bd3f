use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorPolicy;
use crate::properties::{PropertyPath, RuleTable, TypeCast};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither the XDG base directory nor HOME is set")]
    MissingHomeDirectory,
}

pub const CONFIG_FILE: &str = "placement.json";
pub const SKIP_FLAG: &str = "--skipPos";

const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// An extra type cast from `placement.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CastConfig {
    pub type_tag: String,
    pub view_property: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Placement settings from `placement.json`; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Skip restoring geometry when the display layout changed since last run.
    pub skip_on_display_change: bool,
    /// Raise property traversal errors instead of reporting them.
    pub strict_errors: bool,
    pub settle_delay_ms: u64,
    /// Extra `<TypeTag>|<path>` rule lines.
    pub save_properties: Vec<String>,
    pub casts: Vec<CastConfig>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            skip_on_display_change: true,
            strict_errors: false,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            save_properties: Vec::new(),
            casts: Vec::new(),
        }
    }
}

impl PlacementConfig {
    /// Loads `<config root>/<app_dir>/placement.json`, falling back to defaults.
    pub fn load(app_dir: &str) -> Self {
        let (xdg_config_home, home) = config_env_dirs();
        match app_config_path(app_dir, CONFIG_FILE, xdg_config_home.as_deref(), home.as_deref()) {
            Ok(path) => Self::load_from(&path),
            Err(err) => {
                tracing::debug!(%err, "no config directory; using default placement config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(?err, ?path, "failed to parse placement.json; using defaults");
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(?err, ?path, "failed to read placement.json; using defaults");
                Self::default()
            }
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_strict(self.strict_errors)
    }

    /// Adds the configured rule lines and casts; invalid entries are logged and skipped.
    pub fn extend_rules(&self, table: &mut RuleTable) {
        for line in &self.save_properties {
            match table.add_rule_line(line) {
                Ok(true) => tracing::debug!(line = %line, "added property rule"),
                Ok(false) => {}
                Err(err) => tracing::warn!(%err, "skipping invalid property rule"),
            }
        }
        for cast in &self.casts {
            let on_path = match cast.path.as_deref().map(str::parse::<PropertyPath>).transpose() {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(%err, type_tag = %cast.type_tag, "skipping invalid type cast");
                    continue;
                }
            };
            table.add_cast(TypeCast::new(
                cast.type_tag.clone(),
                cast.view_property.clone(),
                on_path,
            ));
        }
    }
}

/// Whether the process was started with `--skipPos` (any letter case).
pub fn skip_requested<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .any(|arg| arg.as_ref().eq_ignore_ascii_case(SKIP_FLAG))
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn data_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = base_root(xdg_config_home, home, ".config")?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

/// Directory holding the store file: `<data root>/<app_dir>`.
pub fn settings_dir(
    app_dir: &str,
    xdg_data_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = base_root(xdg_data_home, home, ".local/share")?;
    path.push(app_dir);
    Ok(path)
}

pub fn default_settings_dir(app_dir: &str) -> Result<PathBuf, ConfigPathError> {
    let (xdg_data_home, home) = data_env_dirs();
    settings_dir(app_dir, xdg_data_home.as_deref(), home.as_deref())
}

fn base_root(
    xdg_dir: Option<&Path>,
    home: Option<&Path>,
    home_relative: &str,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_dir.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(home_relative))
}
