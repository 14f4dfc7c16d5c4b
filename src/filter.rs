//! Client-side problem filtering.

use crate::models::{or_na, ActivityFilter, DetectedProblem};

/// Check whether a problem satisfies every criterion set on `filter`.
///
/// String criteria are exact, case-sensitive matches against the displayed
/// value, so a filter of `N/A` matches a problem with no value. Time bounds
/// are inclusive and apply to `last_detected`; an unknown `last_detected`
/// sorts before any start bound.
pub fn matches(problem: &DetectedProblem, filter: &ActivityFilter) -> bool {
    if !criterion_matches(filter.region.as_deref(), or_na(&problem.region)) {
        return false;
    }
    if !criterion_matches(
        filter.resource_type.as_deref(),
        or_na(&problem.resource_type),
    ) {
        return false;
    }
    if !criterion_matches(filter.problem_id.as_deref(), &problem.id) {
        return false;
    }
    if !criterion_matches(filter.risk_level.as_deref(), problem.risk_level.as_str()) {
        return false;
    }

    if let Some(start) = filter.start_time {
        match problem.last_detected {
            Some(last) if last >= start => {}
            _ => return false,
        }
    }
    if let (Some(end), Some(last)) = (filter.end_time, problem.last_detected) {
        if last > end {
            return false;
        }
    }

    true
}

fn criterion_matches(expected: Option<&str>, actual: &str) -> bool {
    match expected {
        Some(expected) if !expected.is_empty() => expected == actual,
        _ => true,
    }
}
