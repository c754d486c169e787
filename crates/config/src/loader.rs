use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::CanonConfig;

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &["canon.toml", "canon.yaml", "canon.yml", "canon.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<CanonConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./canon.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/canon/canon.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CanonConfig::default()` if no config file is found or the file
/// cannot be loaded.
pub fn discover_and_load() -> CanonConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    CanonConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_config_file_in(Path::new("."))
        .or_else(|| config_dir().and_then(|dir| find_config_file_in(&dir)))
}

/// First config file directly inside `dir`.
pub fn find_config_file_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/canon/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "canon").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canon.toml")
}

pub(crate) fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CanonConfig> {
    let config: CanonConfig = match extension(path) {
        "toml" => toml::from_str(raw)?,
        "yaml" | "yml" => serde_yaml::from_str(raw)?,
        "json" => serde_json::from_str(raw)?,
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    };
    Ok(config.normalized())
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
