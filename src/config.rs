//! TOML configuration.
//!
//! Loaded once at startup from the path given by `--config`. Every section
//! except `[source]` and `[snapshot]` has defaults, so a minimal file names
//! only the database and snapshot directory.
//!
//! ```toml
//! [source]
//! path = "./data/inventory.sqlite"
//!
//! [snapshot]
//! dir = "./data/cache"
//! ```

use anyhow::{Context, Result};
use lot_catalog_core::catalog::{Catalog, EquipmentException};
use lot_catalog_core::snapshot::DisplayZone;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub equipment_exceptions: Vec<EquipmentException>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "vehicles".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
    /// How far a snapshot may lag the source and still be served.
    #[serde(default = "default_stale_tolerance")]
    pub stale_tolerance_secs: u64,
    /// In-server re-materialization period; 0 disables it.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: String,
    #[serde(default = "default_timezone_label")]
    pub timezone_label: String,
}

fn default_stale_tolerance() -> u64 {
    3600
}
fn default_refresh_interval() -> u64 {
    300
}
fn default_timezone_offset() -> String {
    "-08:00".to_string()
}
fn default_timezone_label() -> String {
    "PT".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
    #[serde(default = "default_fresh_max_age")]
    pub fresh_max_age_secs: u64,
    #[serde(default = "default_stale_max_age")]
    pub stale_max_age_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            scan_timeout_secs: default_scan_timeout(),
            fresh_max_age_secs: default_fresh_max_age(),
            stale_max_age_secs: default_stale_max_age(),
        }
    }
}

fn default_per_page() -> usize {
    24
}
fn default_max_per_page() -> usize {
    9999
}
fn default_scan_timeout() -> u64 {
    10
}
fn default_fresh_max_age() -> u64 {
    300
}
fn default_stale_max_age() -> u64 {
    15
}

impl QueryConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Built-in catalog extended with the configured equipment exceptions.
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::builtin().with_exceptions(self.equipment_exceptions.clone())
    }

    pub fn display_zone(&self) -> Result<DisplayZone> {
        DisplayZone::parse(&self.snapshot.timezone_offset, &self.snapshot.timezone_label)
    }
}

/// A plain SQL identifier: letters, digits, and underscores, not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate source
    if !is_identifier(&config.source.table) {
        anyhow::bail!(
            "source.table must be a plain SQL identifier, got '{}'",
            config.source.table
        );
    }

    // Validate query
    if !(1..=9999).contains(&config.query.max_per_page) {
        anyhow::bail!("query.max_per_page must be in [1, 9999]");
    }
    if config.query.default_per_page < 1 || config.query.default_per_page > config.query.max_per_page {
        anyhow::bail!("query.default_per_page must be in [1, query.max_per_page]");
    }
    if config.query.scan_timeout_secs == 0 {
        anyhow::bail!("query.scan_timeout_secs must be > 0");
    }

    // Validate snapshot
    config
        .display_zone()
        .with_context(|| "Invalid snapshot.timezone_offset")?;

    // Validate equipment exceptions
    config
        .catalog()
        .with_context(|| "Invalid equipment_exceptions entry")?;

    Ok(config)
}
