use crate::pipeline::{self, ScanOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default = "default_threshold")]
    pub undocumented_threshold: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            exclude: default_exclude(),
            exclude_globs: Vec::new(),
            include_hidden: false,
            undocumented_threshold: default_threshold(),
        }
    }
}

impl ScanConfig {
    pub fn to_options(&self, root: PathBuf) -> ScanOptions {
        ScanOptions::new(root)
            .with_exclusions(self.exclude.iter().cloned().collect())
            .with_exclude_globs(self.exclude_globs.clone())
            .include_hidden(self.include_hidden)
            .with_threshold(self.undocumented_threshold)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write a Markdown report here after every scan.
    #[serde(default)]
    pub markdown_path: Option<String>,
    /// Persist every scan to the database.
    #[serde(default)]
    pub save: bool,
}

fn default_exclude() -> Vec<String> {
    pipeline::DEFAULT_EXCLUSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_threshold() -> u8 {
    pipeline::DEFAULT_UNDOCUMENTED_THRESHOLD
}

fn default_database_path() -> String {
    "data/zenith.db".to_string()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    // ZENITH_SCAN__UNDOCUMENTED_THRESHOLD -> scan.undocumented_threshold
    settings = settings.add_source(
        config::Environment::with_prefix("ZENITH")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
