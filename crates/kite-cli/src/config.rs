//! CLI configuration file
//!
//! ```toml
//! [client]
//! base_url = "https://api.kitepaint.com/php"
//! cache_duration_secs = 600
//! timeout_secs = 30
//!
//! [editor.compose]
//! panel_attribute = "data-id"
//! fill_attribute = "fill"
//!
//! [feed]
//! page_size = 50
//! ```
//!
//! Every section and key is optional.

use anyhow::Context;
use kite_api::{api_base_for_host, ClientConfig};
use kite_core::{EditorConfig, FeedConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Backend client settings
    pub client: ClientConfig,
    /// Composition settings
    pub editor: EditorConfig,
    /// Listing settings
    pub feed: FeedConfig,
}

impl CliConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Fails on invalid TOML or mistyped keys.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Config file if given, defaults otherwise; `host` picks the backend
    ///
    /// # Errors
    /// See [`CliConfig::load`].
    pub fn resolve(path: Option<&Path>, host: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(host) = host {
            config.client = config.client.with_base_url(api_base_for_host(host));
        }
        tracing::debug!(base_url = %config.client.base_url, "configuration resolved");
        Ok(config)
    }
}
