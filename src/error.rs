// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for wcagbot

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wcagbot
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("No analysis result available")]
    NoSnapshot,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether this error was caused by the caller's input rather than the page
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Url(_))
    }
}
