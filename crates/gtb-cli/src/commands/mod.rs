//! Command handler modules for the `gotobi` binary.
//!
//! Shared config loading lives here; command-specific logic lives in the
//! submodules.

pub mod check;
pub mod now;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use gtb_config::{
    load_layered_yaml, load_layered_yaml_from_strings, report_unused_keys, NotifierConfig,
    UnusedKeyPolicy,
};

/// Directory relative config paths resolve against: the first config
/// file's directory, or the current directory when no file is given.
pub fn config_base_dir(config_paths: &[String]) -> PathBuf {
    config_paths
        .first()
        .and_then(|p| Path::new(p).parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load, hash, check for unused keys and type the layered config.
///
/// Relative paths inside the config are rebased onto [`config_base_dir`].
pub fn load_notifier_config(config_paths: &[String], strict: bool) -> Result<NotifierConfig> {
    let loaded = if config_paths.is_empty() {
        load_layered_yaml_from_strings(&[])?
    } else {
        let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        load_layered_yaml(&refs)?
    };
    tracing::info!(config_hash = %loaded.config_hash, layers = config_paths.len(), "config loaded");

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for ptr in &report.unused_leaf_pointers {
        tracing::warn!(key = %ptr, "unused config key");
    }

    let mut cfg = NotifierConfig::from_json(&loaded.config_json)?;
    cfg.resolve_paths(&config_base_dir(config_paths));
    Ok(cfg)
}
