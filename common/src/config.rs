//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `data_dir`
pub const DATA_DIR_ENV: &str = "DASHBOARD_DATA_DIR";

/// Top-level dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Directory holding one JSON file per domain
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Record caps applied on every save
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Recency windows used by the stats views (in days)
    #[serde(default)]
    pub windows: WindowConfig,

    /// Placeholder scores attached to exported envelopes
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            retention: RetentionConfig::default(),
            windows: WindowConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn news_path(&self) -> PathBuf {
        self.data_dir.join("news.json")
    }

    pub fn macro_analysis_path(&self) -> PathBuf {
        self.data_dir.join("macro_analyses.json")
    }

    pub fn onchain_path(&self) -> PathBuf {
        self.data_dir.join("onchain_tweets.json")
    }

    pub fn video_path(&self) -> PathBuf {
        self.data_dir.join("video_analyses.json")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-domain record caps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_large_cap")]
    pub news: usize,

    #[serde(default = "default_macro_cap")]
    pub macro_analysis: usize,

    #[serde(default = "default_large_cap")]
    pub onchain: usize,

    #[serde(default = "default_large_cap")]
    pub video: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            news: 500,
            macro_analysis: 20,
            onchain: 500,
            video: 500,
        }
    }
}

fn default_large_cap() -> usize {
    500
}

fn default_macro_cap() -> usize {
    20
}

/// Per-domain stats windows (days)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_short_window")]
    pub news: i64,

    #[serde(default = "default_short_window")]
    pub macro_analysis: i64,

    #[serde(default = "default_short_window")]
    pub onchain: i64,

    #[serde(default = "default_video_window")]
    pub video: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            news: 7,
            macro_analysis: 7,
            onchain: 7,
            video: 30,
        }
    }
}

fn default_short_window() -> i64 {
    7
}

fn default_video_window() -> i64 {
    30
}

/// Scores attached to every exported envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default = "default_relevance")]
    pub relevance: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            confidence: 0.8,
            relevance: 0.7,
        }
    }
}

fn default_confidence() -> f64 {
    0.8
}

fn default_relevance() -> f64 {
    0.7
}

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<DashboardConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: DashboardConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &DashboardConfig, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write a commented default configuration file
pub fn create_config_template(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let template = "# Market dashboard configuration

# Directory holding one JSON file per domain
# (overridden by the DASHBOARD_DATA_DIR environment variable)
data_dir = \"data\"

# trace, debug, info, warn or error
log_level = \"info\"

[retention]
# Records kept per domain after each save, newest first
news = 500
macro_analysis = 20
onchain = 500
video = 500

[windows]
# Recency window of the stats views (days)
news = 7
macro_analysis = 7
onchain = 7
video = 30

[export]
# Placeholder scores attached to exported envelopes
confidence = 0.8
relevance = 0.7
";

    std::fs::write(path, template)?;
    Ok(())
}
