// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a jobs file and return the raw, unvalidated `RawConfigFile`.
///
/// Files ending in `.yaml` / `.yml` are parsed as YAML; everything else as
/// TOML. Use [`load_and_validate`] for the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config = if is_yaml(path) {
        serde_yaml::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    Ok(config)
}

/// Load a jobs file and validate it.
///
/// - Reads TOML or YAML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks job names, cron expressions, scripts and timeouts.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
