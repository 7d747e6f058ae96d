//! Configuration management for procwarden.
//!
//! This module handles loading, merging, and validating configuration
//! from files and CLI arguments. It supports YAML, JSON, and TOML
//! formats, chosen by file extension. Precedence: CLI flags over the
//! config file over built-in defaults.

use crate::cli::Args;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Candidate config file locations probed when `--config` is not given.
const CONFIG_SEARCH_PATHS: &[&str] = &[
    "./procwarden.yaml",
    "./procwarden.yml",
    "./procwarden.json",
    "./procwarden.toml",
    "/etc/procwarden/procwarden.yaml",
];

/// Effective configuration. Every field is optional in the file model;
/// accessors supply the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Refresh period for the periodic scheduler, in milliseconds.
    pub refresh_interval_ms: Option<u64>,

    /// Root of the process pseudo-filesystem.
    pub proc_root: Option<PathBuf>,

    /// Start watch mode with focus optimization enabled.
    pub focus_mode: Option<bool>,
}

impl Config {
    pub fn refresh_interval_ms(&self) -> u64 {
        self.refresh_interval_ms
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn focus_mode(&self) -> bool {
        self.focus_mode.unwrap_or(false)
    }
}

/// Loads a config file, dispatching the parser on extension.
fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display())),
        Some("toml") => {
            toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
        }
        other => bail!(
            "Unsupported config extension {:?} for {}",
            other,
            path.display()
        ),
    }
}

/// Resolves the effective configuration: built-in defaults, then the
/// explicit `--config` file (or the first search-path hit), then CLI
/// overrides. An explicit `--config` that cannot be loaded is an error;
/// absent search-path candidates are not.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else if let Some(path) = &args.config {
        load_config_file(path)?
    } else {
        let mut found = Config::default();
        for candidate in CONFIG_SEARCH_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                info!("Loading config from {}", path.display());
                found = load_config_file(path)?;
                break;
            }
        }
        found
    };

    if let Some(interval) = args.interval_ms {
        config.refresh_interval_ms = Some(interval);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if args.focus {
        config.focus_mode = Some(true);
    }

    Ok(config)
}

/// Rejects configurations that cannot work at all.
pub fn validate_effective_config(config: &Config) -> Result<()> {
    if config.refresh_interval_ms() == 0 {
        bail!("refresh_interval_ms must be greater than zero");
    }
    Ok(())
}
