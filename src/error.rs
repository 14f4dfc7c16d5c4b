//! Error types for the Cloud Guard service seam.

use crate::models::DetectedProblem;
use thiserror::Error;

/// Failure talking to the problem service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to Cloud Guard at {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Cloud Guard API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Enrichment failure. Hands the unmodified problem back to the caller.
#[derive(Debug, Error)]
#[error("failed to enrich problem {id}: {source}", id = .problem.id)]
pub struct EnrichError {
    pub problem: Box<DetectedProblem>,
    #[source]
    pub source: ServiceError,
}

impl EnrichError {
    /// Recover the original, unenriched problem.
    pub fn into_problem(self) -> DetectedProblem {
        *self.problem
    }
}
