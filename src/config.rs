// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for wcagbot

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page rendering settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Values written by the fix applier
    #[serde(default)]
    pub fix: FixConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// How pages are loaded and styled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    /// Headless Chrome; scripts run and computed styles come from the browser
    #[default]
    Browser,
    /// Built-in cascade over `<style>`, linked stylesheets and inline styles
    Static,
}

/// Page rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rendering engine
    #[serde(default)]
    pub engine: RenderEngine,

    /// Chrome or Chromium executable; looked up on the system when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Abort the scan if the page has not loaded within this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::default(),
            chrome_path: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("wcagbot/{}", env!("CARGO_PKG_VERSION"))
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum contrast ratio for normal text (WCAG AA is 4.5)
    #[serde(default = "default_min_contrast")]
    pub min_contrast_ratio: f64,

    /// Attach source line numbers and snippets to findings
    #[serde(default = "default_true")]
    pub locate_lines: bool,

    /// Maximum snippet length in characters
    #[serde(default = "default_snippet_len")]
    pub max_snippet_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_contrast_ratio: default_min_contrast(),
            locate_lines: true,
            max_snippet_len: default_snippet_len(),
        }
    }
}

fn default_min_contrast() -> f64 {
    4.5
}

fn default_true() -> bool {
    true
}

fn default_snippet_len() -> usize {
    200
}

/// Fix applier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixConfig {
    /// Foreground forced onto low-contrast elements
    #[serde(default = "default_fix_color")]
    pub color: String,

    /// Background forced onto low-contrast elements
    #[serde(default = "default_fix_background")]
    pub background_color: String,

    /// Outline appended to elements without a focus indicator
    #[serde(default = "default_fix_outline")]
    pub outline: String,

    /// Alt text given to images without one
    #[serde(default = "default_fix_alt")]
    pub alt_text: String,

    /// Font size applied to headings
    #[serde(default = "default_fix_heading_size")]
    pub heading_font_size: String,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            color: default_fix_color(),
            background_color: default_fix_background(),
            outline: default_fix_outline(),
            alt_text: default_fix_alt(),
            heading_font_size: default_fix_heading_size(),
        }
    }
}

fn default_fix_color() -> String {
    "#000".to_string()
}

fn default_fix_background() -> String {
    "#fff".to_string()
}

fn default_fix_outline() -> String {
    "3px solid #005fcc".to_string()
}

fn default_fix_alt() -> String {
    "Description added for accessibility".to_string()
}

fn default_fix_heading_size() -> String {
    "32px".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|e| e == "toml").unwrap_or(false)
}

/// Load configuration from a path, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if is_toml(path) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    if !(config.analysis.min_contrast_ratio >= 1.0 && config.analysis.min_contrast_ratio <= 21.0) {
        return Err(Error::Config(format!(
            "analysis.min_contrast_ratio must be between 1 and 21, got {}",
            config.analysis.min_contrast_ratio
        )));
    }

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Default config location in the working directory
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".wcagbot.yml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config).map_err(|e| Error::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}
