//! CSV export of detected problems.

use crate::models::{or_na, DetectedProblem, NOT_AVAILABLE};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Column order of the exported file.
pub const CSV_HEADERS: [&str; 17] = [
    "Problem_ID",
    "First_Detected",
    "Last_Detected",
    "Days_Since_Detection",
    "Resource_ID",
    "Resource_Name",
    "Resource_Type",
    "Region",
    "Compartment_ID",
    "Detector",
    "Risk_Level",
    "Description",
    "Recommendation",
    "Detector_Rule_ID",
    "Target_ID",
    "Labels",
    "Lifecycle_State",
];

/// Write problems to a CSV file, replacing any existing file.
///
/// Missing parent directories are created.
pub fn export_csv(problems: &[DetectedProblem], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    write_csv(problems, file)
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;

    info!("Wrote {} rows to {}", problems.len(), path.display());
    Ok(())
}

/// Write the header row and one row per problem, in order.
pub fn write_csv<W: Write>(problems: &[DetectedProblem], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(CSV_HEADERS)?;

    for problem in problems {
        debug!("Writing row for {}", problem.id);
        wtr.write_record(problem_row(problem))?;
    }

    wtr.flush()?;
    Ok(())
}

fn problem_row(problem: &DetectedProblem) -> [String; 17] {
    [
        problem.id.clone(),
        timestamp(problem.first_detected),
        timestamp(problem.last_detected),
        problem.days_since_detection.to_string(),
        or_na(&problem.resource_id).to_string(),
        or_na(&problem.resource_name).to_string(),
        problem.resource_type_or_na().to_string(),
        problem.region_or_na().to_string(),
        or_na(&problem.compartment_id).to_string(),
        problem.detector.clone(),
        problem.risk_level.to_string(),
        or_na(&problem.description).to_string(),
        or_na(&problem.recommendation).to_string(),
        or_na(&problem.detector_rule_id).to_string(),
        or_na(&problem.target_id).to_string(),
        problem.labels_joined(),
        problem.lifecycle_state.clone(),
    ]
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
