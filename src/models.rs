//! Data models for the activity reporter.
//!
//! This module contains the core data structures used throughout
//! the application for representing detected problems, query filters,
//! and activity summaries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Placeholder rendered wherever an optional value is absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Detector name used when a rule identifier doesn't follow the expected layout.
pub const UNKNOWN_DETECTOR: &str = "UNKNOWN";

/// Risk level of a detected problem.
///
/// Values the service sends that are not one of the four known levels
/// are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

impl RiskLevel {
    /// Returns the wire representation of the risk level.
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
            RiskLevel::Other(s) => s,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s {
            "CRITICAL" => RiskLevel::Critical,
            "HIGH" => RiskLevel::High,
            "MEDIUM" => RiskLevel::Medium,
            "LOW" => RiskLevel::Low,
            other => RiskLevel::Other(other.to_string()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        RiskLevel::from(s.as_str())
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

/// A single security finding reported by Cloud Guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedProblem {
    /// Unique problem identifier.
    pub id: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
    pub region: Option<String>,
    pub compartment_id: Option<String>,
    /// Severity classification.
    pub risk_level: RiskLevel,
    /// Detector category derived from the rule identifier.
    pub detector: String,
    pub detector_rule_id: Option<String>,
    pub first_detected: Option<DateTime<Utc>>,
    pub last_detected: Option<DateTime<Utc>>,
    /// Whole days between `first_detected` and the moment of fetching.
    pub days_since_detection: i64,
    /// Filled in by enrichment.
    pub description: Option<String>,
    /// Filled in by enrichment.
    pub recommendation: Option<String>,
    pub labels: Vec<String>,
    pub target_id: Option<String>,
    pub lifecycle_state: String,
}

impl DetectedProblem {
    /// Resource type with the sentinel applied.
    pub fn resource_type_or_na(&self) -> &str {
        or_na(&self.resource_type)
    }

    /// Region with the sentinel applied.
    pub fn region_or_na(&self) -> &str {
        or_na(&self.region)
    }

    /// Labels joined with `|`, or the sentinel when there are none.
    pub fn labels_joined(&self) -> String {
        if self.labels.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.labels.join("|")
        }
    }
}

/// Borrow an optional string, falling back to the `N/A` sentinel.
pub fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

/// Query and filter criteria for a single run.
///
/// `None` criteria never exclude a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFilter {
    pub compartment_id: String,
    pub region: Option<String>,
    pub resource_type: Option<String>,
    pub problem_id: Option<String>,
    pub risk_level: Option<String>,
    /// Inclusive lower bound on `last_detected`.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `last_detected`.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of problems kept.
    pub limit: usize,
}

impl ActivityFilter {
    /// Creates a filter without criteria for the given compartment.
    pub fn new(compartment_id: impl Into<String>, limit: usize) -> Self {
        Self {
            compartment_id: compartment_id.into(),
            region: None,
            resource_type: None,
            problem_id: None,
            risk_level: None,
            start_time: None,
            end_time: None,
            limit,
        }
    }

    /// Restricts the filter to the window `[now - days, now]`.
    ///
    /// Returns `None` when the window start falls outside the representable range.
    pub fn for_window(mut self, now: DateTime<Utc>, days: u32) -> Option<Self> {
        self.start_time = Some(now.checked_sub_signed(Duration::days(i64::from(days)))?);
        self.end_time = Some(now);
        Some(self)
    }
}

/// Aggregated view over a completed set of problems.
#[derive(Debug, Clone, Default)]
pub struct ActivitySummary {
    pub total: usize,
    pub by_risk_level: HashMap<String, usize>,
    pub by_resource_type: HashMap<String, usize>,
    pub by_detector: HashMap<String, usize>,
    pub by_region: HashMap<String, usize>,
    /// Leading problems in arrival order, not sorted by recency.
    pub recent: Vec<DetectedProblem>,
}
