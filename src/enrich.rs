//! Problem enrichment with details from the problem lookup.

use crate::error::EnrichError;
use crate::models::DetectedProblem;
use crate::source::ProblemService;
use tracing::debug;

/// Merges description and recommendation into fetched problems.
pub struct Enricher<'a, S: ProblemService> {
    service: &'a S,
}

impl<'a, S: ProblemService> Enricher<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Look up `problem` and fill in its description and recommendation.
    ///
    /// A single attempt is made. On failure the untouched problem is
    /// returned inside the error.
    pub async fn enrich(&self, mut problem: DetectedProblem) -> Result<DetectedProblem, EnrichError> {
        match self.service.get_problem(&problem.id).await {
            Ok(detail) => {
                debug!("Enriched problem {}", problem.id);
                problem.description = detail.description;
                problem.recommendation = detail.recommendation;
                Ok(problem)
            }
            Err(source) => Err(EnrichError {
                problem: Box::new(problem),
                source,
            }),
        }
    }
}
