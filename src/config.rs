//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cloudguard-activity.toml` files.

use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".cloudguard-activity.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cloud Guard service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default CSV output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Number of days back to search.
    #[serde(default = "default_days")]
    pub days: u32,

    /// Maximum number of problems to keep.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            days: default_days(),
            limit: default_limit(),
        }
    }
}

fn default_output() -> String {
    "cloudguard_activity.csv".to_string()
}

fn default_days() -> u32 {
    7
}

fn default_limit() -> usize {
    1000
}

/// Cloud Guard service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Explicit API endpoint. Derived from `region` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Region hosting the Cloud Guard API.
    #[serde(default = "default_region")]
    pub region: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ServiceConfig {
    /// The endpoint requests go to.
    pub fn resolved_endpoint(&self) -> String {
        match self.endpoint {
            Some(ref endpoint) => endpoint.clone(),
            None => format!("https://cloudguard-cps.{}.oci.oraclecloud.com", self.region),
        }
    }
}

fn default_region() -> String {
    "us-ashburn-1".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Summary rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of problems listed under "Most Recent Problems" (at most 5).
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,

    /// Maximum description length in the recent listing.
    #[serde(default = "default_description_width")]
    pub description_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_count: default_recent_count(),
            description_width: default_description_width(),
        }
    }
}

fn default_recent_count() -> usize {
    crate::analysis::MAX_RECENT
}

fn default_description_width() -> usize {
    crate::report::summary::DESCRIPTION_WIDTH
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge command-line arguments into the configuration.
    ///
    /// Arguments only override the file when they were given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(days) = args.days {
            self.general.days = days;
        }
        if let Some(limit) = args.limit {
            self.general.limit = limit;
        }

        if let Some(ref endpoint) = args.endpoint {
            self.service.endpoint = Some(endpoint.clone());
        }
        if let Some(ref region) = args.service_region {
            self.service.region = region.clone();
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }
    }

    /// Check the merged settings before any request is made.
    pub fn validate(&self) -> Result<()> {
        if self.general.limit == 0 {
            anyhow::bail!("Limit must be at least 1");
        }
        if self.service.timeout_seconds == 0 {
            anyhow::bail!("Timeout must be at least 1 second");
        }
        if let Some(ref endpoint) = self.service.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                anyhow::bail!("Endpoint must start with 'http://' or 'https://'");
            }
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
