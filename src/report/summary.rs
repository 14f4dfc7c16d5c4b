//! Human-readable activity summary.

use crate::analysis::ranked;
use crate::models::{ActivitySummary, DetectedProblem, NOT_AVAILABLE};

/// Default maximum description length in the recent-problem listing.
pub const DESCRIPTION_WIDTH: usize = 50;

/// Render the summary shown on the terminal.
///
/// Breakdown sections are omitted entirely when there are no problems.
pub fn render_summary(summary: &ActivitySummary, description_width: usize) -> String {
    let mut output = String::new();

    output.push_str("\n=== CLOUD GUARD ACTIVITY SUMMARY ===\n");
    output.push_str(&format!("Total problems detected: {}\n", summary.total));

    if summary.total == 0 {
        return output;
    }

    output.push_str("\nBy Risk Level:\n");
    for (level, count) in ranked(&summary.by_risk_level) {
        let percentage = count as f64 / summary.total as f64 * 100.0;
        output.push_str(&format!(
            "  {:<10}: {:>3} ({:>5.1}%)\n",
            level, count, percentage
        ));
    }

    output.push_str("\nBy Resource Type:\n");
    for (resource_type, count) in ranked(&summary.by_resource_type) {
        output.push_str(&format!("  {:<25}: {:>3}\n", resource_type, count));
    }

    output.push_str("\nBy Detector:\n");
    for (detector, count) in ranked(&summary.by_detector) {
        output.push_str(&format!("  {:<20}: {:>3}\n", detector, count));
    }

    output.push_str("\nBy Region:\n");
    for (region, count) in ranked(&summary.by_region) {
        output.push_str(&format!("  {:<20}: {:>3}\n", region, count));
    }

    output.push_str("\nMost Recent Problems:\n");
    for (i, problem) in summary.recent.iter().enumerate() {
        output.push_str(&recent_line(i + 1, problem, description_width));
    }

    output
}

fn recent_line(position: usize, problem: &DetectedProblem, description_width: usize) -> String {
    let description = match problem.description.as_deref() {
        Some(desc) if desc != NOT_AVAILABLE => desc.to_string(),
        _ => format!("{} issue", problem.resource_type_or_na()),
    };

    let last_detected = problem
        .last_detected
        .map(|t| t.format("%m/%d %H:%M").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "  {}. [{}] {} - {} ({}) - {} days ago\n",
        position,
        last_detected,
        problem.resource_type_or_na(),
        truncate(&description, description_width),
        problem.risk_level,
        problem.days_since_detection
    )
}

/// Cut `s` to at most `width` characters, marking the cut with `...`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width).collect();
    cut.push_str("...");
    cut
}
