//! Problem aggregation and statistics.
//!
//! This module builds the frequency tables and the recent-problem sample
//! shown in the activity summary.

use crate::models::{ActivitySummary, DetectedProblem};
use std::collections::HashMap;

/// Upper bound on the number of problems kept in the recent sample.
pub const MAX_RECENT: usize = 5;

/// Summarize a completed set of problems.
///
/// The recent sample keeps the first `MAX_RECENT` problems in the order
/// given; callers wanting the newest first must sort beforehand.
pub fn summarize(problems: &[DetectedProblem]) -> ActivitySummary {
    let mut summary = ActivitySummary {
        total: problems.len(),
        ..Default::default()
    };

    for problem in problems {
        bump(&mut summary.by_risk_level, problem.risk_level.as_str());
        bump(&mut summary.by_resource_type, problem.resource_type_or_na());
        bump(&mut summary.by_detector, &problem.detector);
        bump(&mut summary.by_region, problem.region_or_na());
    }

    let take = MAX_RECENT.min(problems.len());
    summary.recent = problems[..take].to_vec();

    summary
}

fn bump(table: &mut HashMap<String, usize>, key: &str) {
    *table.entry(key.to_string()).or_default() += 1;
}

/// Sort problems newest first by last detection time.
///
/// Problems without a detection time go last.
pub fn sort_by_last_detected(problems: &mut [DetectedProblem]) {
    problems.sort_by(|a, b| b.last_detected.cmp(&a.last_detected));
}

/// Order a frequency table by count (highest first), ties by key.
pub fn ranked(table: &HashMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<_> = table.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::problem;
    use crate::models::RiskLevel;
    use chrono::Duration;

    fn with_risk(id: &str, risk: RiskLevel) -> DetectedProblem {
        DetectedProblem {
            risk_level: risk,
            ..problem(id)
        }
    }

    #[test]
    fn test_summarize_counts() {
        let mut problems = vec![
            with_risk("p1", RiskLevel::Critical),
            with_risk("p2", RiskLevel::High),
            with_risk("p3", RiskLevel::High),
        ];
        problems[2].region = None;
        problems[2].detector = "UNKNOWN".to_string();

        let summary = summarize(&problems);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_risk_level.get("CRITICAL"), Some(&1));
        assert_eq!(summary.by_risk_level.get("HIGH"), Some(&2));
        assert_eq!(summary.by_region.get("us-ashburn-1"), Some(&2));
        assert_eq!(summary.by_region.get("N/A"), Some(&1));
        assert_eq!(summary.by_detector.get("UNKNOWN"), Some(&1));
        assert_eq!(summary.by_resource_type.get("Instance"), Some(&3));
    }

    #[test]
    fn test_table_totals_match() {
        let problems: Vec<_> = (0..9)
            .map(|i| {
                let mut p = problem(&format!("p{}", i));
                if i % 3 == 0 {
                    p.resource_type = Some("Bucket".to_string());
                }
                if i % 2 == 0 {
                    p.region = Some("eu-frankfurt-1".to_string());
                }
                p
            })
            .collect();

        let summary = summarize(&problems);

        for table in [
            &summary.by_risk_level,
            &summary.by_resource_type,
            &summary.by_detector,
            &summary.by_region,
        ] {
            assert_eq!(table.values().sum::<usize>(), summary.total);
        }
    }

    #[test]
    fn test_recent_keeps_arrival_order() {
        let base = problem("base").last_detected.unwrap();
        let problems: Vec<_> = (0..7)
            .map(|i| {
                let mut p = problem(&format!("p{}", i));
                p.last_detected = Some(base + Duration::hours(i));
                p
            })
            .collect();

        let summary = summarize(&problems);
        let ids: Vec<_> = summary.recent.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_recent_smaller_than_cap() {
        let problems = vec![problem("a"), problem("b")];
        assert_eq!(summarize(&problems).recent.len(), 2);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.by_risk_level.is_empty());
        assert!(summary.recent.is_empty());
    }

    #[test]
    fn test_sort_by_last_detected() {
        let older = problem("older");
        let mut newer = problem("newer");
        let mut unknown = problem("unknown");
        newer.last_detected = older.last_detected.map(|t| t + Duration::days(1));
        unknown.last_detected = None;

        let mut problems = vec![unknown, older, newer];
        sort_by_last_detected(&mut problems);

        let ids: Vec<_> = problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older", "unknown"]);
    }

    #[test]
    fn test_ranked_order() {
        let table: HashMap<String, usize> = [
            ("b".to_string(), 2),
            ("a".to_string(), 2),
            ("c".to_string(), 5),
        ]
        .into_iter()
        .collect();

        assert_eq!(ranked(&table), vec![("c", 5), ("a", 2), ("b", 2)]);
    }
}
