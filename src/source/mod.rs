//! Problem retrieval from Cloud Guard.
//!
//! [`ProblemService`] is the seam to the remote service, [`CloudGuardClient`]
//! its HTTP implementation, and [`ProblemSource`] walks the paginated listing,
//! filtering and enriching problems as they arrive.

pub mod client;

pub use client::CloudGuardClient;

use crate::enrich::Enricher;
use crate::error::ServiceError;
use crate::filter;
use crate::models::{
    ActivityFilter, DetectedProblem, RiskLevel, NOT_AVAILABLE, UNKNOWN_DETECTOR,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One entry of the problem listing, as sent by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: Option<String>,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
    pub region: Option<String>,
    pub compartment_id: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub detector_rule_id: Option<String>,
    pub labels: Option<Vec<String>>,
    pub time_first_detected: Option<DateTime<Utc>>,
    pub time_last_detected: Option<DateTime<Utc>>,
    pub target_id: Option<String>,
    pub lifecycle_state: Option<String>,
}

/// A single page of the problem listing.
#[derive(Debug, Clone, Default)]
pub struct ProblemPage {
    pub items: Vec<ProblemSummary>,
    /// Continuation token; `None` on the last page.
    pub next_page: Option<String>,
}

/// Extended details of a single problem.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    pub description: Option<String>,
    pub recommendation: Option<String>,
}

/// Remote operations the reporter needs from Cloud Guard.
#[async_trait]
pub trait ProblemService: Send + Sync {
    /// List one page of problems in a compartment.
    async fn list_problems(
        &self,
        compartment_id: &str,
        limit: usize,
        page: Option<&str>,
    ) -> Result<ProblemPage, ServiceError>;

    /// Fetch the details of a single problem.
    async fn get_problem(&self, problem_id: &str) -> Result<ProblemDetail, ServiceError>;
}

/// Derive the detector name from a detector rule id.
///
/// Rule ids look like `ocid1.cloudguarddetectorrule.oc1..xxx:ConfigurationDetector:yyy`;
/// anything without a second `:`-separated component maps to `UNKNOWN`.
pub fn detector_from_rule_id(rule_id: &str) -> String {
    rule_id
        .split(':')
        .nth(1)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_DETECTOR.to_string())
}

/// Whole days elapsed since `first_detected`, or 0 when unknown.
pub fn days_since(first_detected: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    first_detected
        .map(|first| (now - first).num_hours() / 24)
        .unwrap_or(0)
}

impl ProblemSummary {
    /// Map the wire record into a [`DetectedProblem`] as seen at `now`.
    pub fn into_problem(self, now: DateTime<Utc>) -> DetectedProblem {
        let detector = self
            .detector_rule_id
            .as_deref()
            .map(detector_from_rule_id)
            .unwrap_or_else(|| UNKNOWN_DETECTOR.to_string());

        DetectedProblem {
            id: self.id.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            resource_id: self.resource_id,
            resource_name: self.resource_name,
            resource_type: self.resource_type,
            region: self.region,
            compartment_id: self.compartment_id,
            risk_level: self
                .risk_level
                .unwrap_or_else(|| RiskLevel::Other(String::new())),
            detector,
            detector_rule_id: self.detector_rule_id,
            first_detected: self.time_first_detected,
            last_detected: self.time_last_detected,
            days_since_detection: days_since(self.time_first_detected, now),
            description: None,
            recommendation: None,
            labels: self.labels.unwrap_or_default(),
            target_id: self.target_id,
            lifecycle_state: self.lifecycle_state.unwrap_or_default(),
        }
    }
}

/// Paginated, filtered and enriched problem retrieval.
pub struct ProblemSource<'a, S: ProblemService> {
    service: &'a S,
    enricher: Enricher<'a, S>,
    progress: Option<ProgressBar>,
}

impl<'a, S: ProblemService> ProblemSource<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            enricher: Enricher::new(service),
            progress: None,
        }
    }

    /// Report fetch progress on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch every problem matching `filter`, up to `filter.limit`.
    ///
    /// Only a failing page listing aborts the fetch. A failed detail lookup
    /// keeps the problem without description and recommendation.
    pub async fn fetch(
        &self,
        filter: &ActivityFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<DetectedProblem>, ServiceError> {
        let mut problems: Vec<DetectedProblem> = Vec::new();
        let mut page: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let response = self
                .service
                .list_problems(&filter.compartment_id, filter.limit, page.as_deref())
                .await?;
            pages += 1;
            debug!("Page {} returned {} problems", pages, response.items.len());

            for summary in response.items {
                if problems.len() >= filter.limit {
                    break;
                }

                let problem = summary.into_problem(now);
                if !filter::matches(&problem, filter) {
                    continue;
                }

                match self.enricher.enrich(problem).await {
                    Ok(enriched) => problems.push(enriched),
                    Err(e) => {
                        warn!("{}", e);
                        problems.push(e.into_problem());
                    }
                }
            }

            if let Some(ref pb) = self.progress {
                pb.set_message(format!("{} pages, {} problems kept", pages, problems.len()));
            }

            if problems.len() >= filter.limit {
                info!("Reached limit of {} problems", filter.limit);
                break;
            }

            match response.next_page {
                Some(token) => page = Some(token),
                None => break,
            }
        }

        info!("Fetched {} problems across {} pages", problems.len(), pages);
        Ok(problems)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{page, summary, FakeService};
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_detector_from_rule_id() {
        assert_eq!(
            detector_from_rule_id("ocid1.cloudguarddetectorrule.oc1..abc:ConfigurationDetector:xyz"),
            "ConfigurationDetector"
        );
        assert_eq!(detector_from_rule_id("ocid1.cloudguarddetectorrule.oc1..abc"), "UNKNOWN");
        assert_eq!(detector_from_rule_id("prefix:ThreatDetector"), "ThreatDetector");
    }

    #[test]
    fn test_days_since() {
        let now = now();
        assert_eq!(days_since(Some(now - Duration::days(5)), now), 5);
        assert_eq!(days_since(Some(now - Duration::hours(47)), now), 1);
        assert_eq!(days_since(None, now), 0);
    }

    #[test]
    fn test_into_problem_ignores_last_detected_for_age() {
        let now = now();
        let wire = ProblemSummary {
            id: Some("p1".to_string()),
            time_first_detected: Some(now - Duration::days(5)),
            time_last_detected: Some(now - Duration::hours(1)),
            ..Default::default()
        };

        let problem = wire.into_problem(now);
        assert_eq!(problem.days_since_detection, 5);
        assert_eq!(problem.detector, "UNKNOWN");
        assert_eq!(problem.resource_type, None);
        assert_eq!(problem.resource_type_or_na(), "N/A");
        assert!(problem.labels.is_empty());
    }

    #[test]
    fn test_into_problem_missing_id_uses_sentinel() {
        let problem = ProblemSummary::default().into_problem(now());
        assert_eq!(problem.id, "N/A");
        assert_eq!(problem.risk_level, RiskLevel::Other(String::new()));
    }

    #[test]
    fn test_fetch_walks_all_pages() {
        let service = FakeService {
            pages: vec![
                page(vec![summary("p1", "HIGH"), summary("p2", "LOW")], Some("t1")),
                page(vec![summary("p3", "CRITICAL")], None),
            ],
            ..Default::default()
        };
        let filter = ActivityFilter::new("ocid1.compartment.oc1..c", 100);

        let problems = tokio_test::block_on(ProblemSource::new(&service).fetch(&filter, now()))
            .unwrap();

        let ids: Vec<_> = problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(problems[0].detector, "ActivityDetector");
        assert_eq!(
            *service.list_calls.lock().unwrap(),
            vec![None, Some("t1".to_string())]
        );
    }

    #[test]
    fn test_fetch_stops_at_limit_mid_pagination() {
        let service = FakeService {
            pages: vec![
                page(vec![summary("p1", "HIGH"), summary("p2", "HIGH")], Some("t1")),
                page(vec![summary("p3", "HIGH"), summary("p4", "HIGH")], Some("t2")),
                page(vec![summary("p5", "HIGH")], None),
            ],
            ..Default::default()
        };
        let filter = ActivityFilter::new("c", 3);

        let problems = tokio_test::block_on(ProblemSource::new(&service).fetch(&filter, now()))
            .unwrap();

        assert_eq!(problems.len(), 3);
        assert_eq!(service.list_call_count(), 2);
        assert_eq!(service.detail_call_count(), 3);
    }

    #[test]
    fn test_fetch_filters_before_enrichment() {
        let service = FakeService {
            pages: vec![page(
                vec![
                    summary("p1", "HIGH"),
                    summary("p2", "LOW"),
                    summary("p3", "HIGH"),
                ],
                None,
            )],
            ..Default::default()
        };
        let mut filter = ActivityFilter::new("c", 10);
        filter.risk_level = Some("HIGH".to_string());

        let problems = tokio_test::block_on(ProblemSource::new(&service).fetch(&filter, now()))
            .unwrap();

        assert_eq!(problems.len(), 2);
        assert_eq!(
            *service.detail_calls.lock().unwrap(),
            vec!["p1".to_string(), "p3".to_string()]
        );
    }

    #[test]
    fn test_fetch_keeps_problem_when_enrichment_fails() {
        let mut service = FakeService {
            pages: vec![page(vec![summary("p1", "HIGH"), summary("p2", "HIGH")], None)],
            ..Default::default()
        };
        service.details.insert(
            "p1".to_string(),
            ProblemDetail {
                description: Some("Bucket is public".to_string()),
                recommendation: Some("Make it private".to_string()),
            },
        );
        let filter = ActivityFilter::new("c", 10);

        let problems = tokio_test::block_on(ProblemSource::new(&service).fetch(&filter, now()))
            .unwrap();

        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].description.as_deref(), Some("Bucket is public"));
        assert_eq!(problems[1].description, None);
        assert_eq!(problems[1].recommendation, None);
    }

    #[test]
    fn test_fetch_propagates_listing_failure() {
        let service = FakeService {
            fail_listing: true,
            ..Default::default()
        };
        let filter = ActivityFilter::new("c", 10);

        let result = tokio_test::block_on(ProblemSource::new(&service).fetch(&filter, now()));

        assert!(matches!(result, Err(ServiceError::Status { status: 401, .. })));
    }
}
