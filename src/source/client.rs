//! Cloud Guard REST client.
//!
//! Talks to the `20200131` Cloud Guard API with reqwest. Request signing is
//! not performed here; the endpoint may point at a signing gateway.

use super::{ProblemDetail, ProblemPage, ProblemService, ProblemSummary};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "20200131";
const NEXT_PAGE_HEADER: &str = "opc-next-page";

#[derive(Debug, Deserialize)]
struct ProblemCollection {
    #[serde(default)]
    items: Vec<ProblemSummary>,
}

/// HTTP implementation of [`ProblemService`].
pub struct CloudGuardClient {
    http_client: reqwest::Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl CloudGuardClient {
    /// Build a client for the configured endpoint.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let endpoint = config.resolved_endpoint();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ServiceError::InvalidEndpoint(endpoint));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("cloudguard-activity/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServiceError::Client)?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn problems_url(&self) -> String {
        format!("{}/{}/problems", self.endpoint, API_VERSION)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(self.timeout_seconds)
            } else if e.is_connect() {
                ServiceError::Connect(self.endpoint.clone())
            } else {
                ServiceError::Request(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl ProblemService for CloudGuardClient {
    async fn list_problems(
        &self,
        compartment_id: &str,
        limit: usize,
        page: Option<&str>,
    ) -> Result<ProblemPage, ServiceError> {
        let mut query = vec![
            ("compartmentId", compartment_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(token) = page {
            query.push(("page", token.to_string()));
        }

        debug!("Listing problems (page token: {:?})", page);
        let response = self
            .send(self.http_client.get(self.problems_url()).query(&query))
            .await?;

        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from);

        let collection: ProblemCollection = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        Ok(ProblemPage {
            items: collection.items,
            next_page,
        })
    }

    async fn get_problem(&self, problem_id: &str) -> Result<ProblemDetail, ServiceError> {
        let url = format!("{}/{}", self.problems_url(), problem_id);
        debug!("Fetching problem details for {}", problem_id);

        let response = self.send(self.http_client.get(url)).await?;

        response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}
