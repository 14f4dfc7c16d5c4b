//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and conversion into an [`ActivityFilter`].

use crate::config::GeneralConfig;
use crate::models::ActivityFilter;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

/// Usage line printed when no compartment was given.
pub const USAGE_HINT: &str = "Usage: cloudguard-activity --compartment-id ocid1.compartment.oc1..xxx \
[--output activity.csv] [--days 7] [--region us-ashburn-1] [--resource-type Instance] \
[--problem-id xxx] [--risk-level HIGH] [--limit 1000] [--summary]";

/// CloudGuard Activity - Cloud Guard problem reporter
///
/// Lists the problems Cloud Guard detected in a compartment over the
/// last few days, prints a summary and exports them to CSV.
///
/// Examples:
///   cloudguard-activity --compartment-id ocid1.compartment.oc1..xxx
///   cloudguard-activity --compartment-id ocid1.tenancy.oc1..xxx --days 5 --risk-level HIGH
///   cloudguard-activity --resource-type Bucket --output reports/buckets.csv
///   cloudguard-activity --summary
///   cloudguard-activity --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Compartment OCID to search
    ///
    /// Falls back to the OCI_COMPARTMENT_ID environment variable.
    #[arg(long, value_name = "OCID", env = "OCI_COMPARTMENT_ID")]
    pub compartment_id: Option<String>,

    /// Output CSV file [default: cloudguard_activity.csv]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of days back to search [default: 7]
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Only keep problems in this region
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Only keep problems on this resource type (e.g. Instance, Bucket)
    #[arg(long, value_name = "TYPE")]
    pub resource_type: Option<String>,

    /// Only keep the problem with this id
    #[arg(long, value_name = "OCID")]
    pub problem_id: Option<String>,

    /// Only keep problems at this risk level (CRITICAL, HIGH, MEDIUM, LOW)
    #[arg(long, value_name = "LEVEL")]
    pub risk_level: Option<String>,

    /// Maximum number of problems to keep [default: 1000]
    #[arg(short, long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Print the summary only (no CSV export)
    #[arg(short, long)]
    pub summary: bool,

    /// Order problems by last detection time, newest first
    ///
    /// By default problems are kept in the order Cloud Guard returns them.
    #[arg(long)]
    pub newest_first: bool,

    /// Cloud Guard API endpoint
    ///
    /// Defaults to the public endpoint of the service region.
    #[arg(long, value_name = "URL", env = "OCI_CLOUDGUARD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region hosting the Cloud Guard API [default: us-ashburn-1]
    #[arg(long, value_name = "REGION", env = "OCI_REGION")]
    pub service_region: Option<String>,

    /// Request timeout in seconds [default: 60]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cloudguard-activity.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cloudguard-activity.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The compartment to search.
    ///
    /// The error carries the usage line after the message.
    pub fn compartment_id(&self) -> Result<&str> {
        non_empty(&self.compartment_id)
            .ok_or_else(|| anyhow::anyhow!("compartment-id is required\n{}", USAGE_HINT))
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Build the run's filter for the window ending at `now`.
    pub fn to_filter(
        &self,
        compartment_id: &str,
        general: &GeneralConfig,
        now: DateTime<Utc>,
    ) -> Result<ActivityFilter> {
        let mut filter = ActivityFilter::new(compartment_id, general.limit)
            .for_window(now, general.days)
            .ok_or_else(|| anyhow::anyhow!("Days value {} is out of range", general.days))?;
        filter.region = non_empty(&self.region).map(String::from);
        filter.resource_type = non_empty(&self.resource_type).map(String::from);
        filter.problem_id = non_empty(&self.problem_id).map(String::from);
        filter.risk_level = non_empty(&self.risk_level).map(String::from);
        Ok(filter)
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub fn make_args() -> Args {
        Args {
            compartment_id: Some("ocid1.compartment.oc1..test".to_string()),
            output: None,
            days: None,
            region: None,
            resource_type: None,
            problem_id: None,
            risk_level: None,
            limit: None,
            summary: false,
            newest_first: false,
            endpoint: None,
            service_region: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "cloudguard-activity",
            "--compartment-id",
            "ocid1.tenancy.oc1..x",
            "--days",
            "5",
            "--risk-level",
            "HIGH",
            "--summary",
        ])
        .unwrap();

        assert_eq!(args.compartment_id().unwrap(), "ocid1.tenancy.oc1..x");
        assert_eq!(args.days, Some(5));
        assert_eq!(args.risk_level.as_deref(), Some("HIGH"));
        assert!(args.summary);
        assert_eq!(args.limit, None);
    }

    #[test]
    fn test_empty_compartment_is_missing() {
        let mut args = make_args();
        args.compartment_id = Some(String::new());
        assert!(args.compartment_id().is_err());

        args.compartment_id = None;
        let message = format!("Error: {:#}", args.compartment_id().unwrap_err());
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines[0], "Error: compartment-id is required");
        assert!(lines[1].starts_with("Usage: cloudguard-activity"));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_limits() {
        let mut args = make_args();
        assert!(args.validate().is_ok());

        args.limit = Some(0);
        assert!(args.validate().is_err());

        args.limit = Some(10);
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        args.timeout = None;
        args.endpoint = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_to_filter() {
        let mut args = make_args();
        args.region = Some("us-phoenix-1".to_string());
        args.resource_type = Some(String::new());
        args.risk_level = Some("CRITICAL".to_string());

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let general = GeneralConfig::default();
        let filter = args
            .to_filter("ocid1.compartment.oc1..test", &general, now)
            .unwrap();

        assert_eq!(filter.compartment_id, "ocid1.compartment.oc1..test");
        assert_eq!(filter.region.as_deref(), Some("us-phoenix-1"));
        assert_eq!(filter.resource_type, None);
        assert_eq!(filter.risk_level.as_deref(), Some("CRITICAL"));
        assert_eq!(filter.limit, 1000);
        assert_eq!(filter.start_time, Some(now - Duration::days(7)));
        assert_eq!(filter.end_time, Some(now));
    }

    #[test]
    fn test_to_filter_rejects_oversized_window() {
        let args = make_args();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let general = GeneralConfig {
            days: 100_000_000,
            ..GeneralConfig::default()
        };

        let err = args
            .to_filter("ocid1.compartment.oc1..test", &general, now)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
