//! Search service client.
//!
//! The search service fronts Elasticsearch and exposes the index under more
//! than one path depending on deployment, so queries try each known endpoint
//! in order and keep the first that answers.

use tracing::instrument;

use super::{ServiceClient, with_query};
use crate::error::ApiError;
use crate::models::{SearchResponse, SearchResults};

const SEARCH_ENDPOINTS: &[&str] = &["_search", "products/_search", "product/_search"];

const SUGGESTION_LIMIT: usize = 5;

#[derive(Clone)]
pub struct SearchClient {
    api: ServiceClient,
}

impl SearchClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            api: ServiceClient::new(http, base_url, "search"),
        }
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank query, or the last
    /// endpoint's error when none of them answers.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("search query is required".to_owned()));
        }
        let response = self.query_endpoints(&[("q", query)]).await?;
        Ok(SearchResults::from_response(query, response))
    }

    /// Up to five product titles matching a prefix. Queries shorter than two
    /// characters return no suggestions without calling the service.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when no endpoint answers.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let size = SUGGESTION_LIMIT.to_string();
        let response = self
            .query_endpoints(&[("q", query), ("size", size.as_str())])
            .await?;
        Ok(SearchResults::from_response(query, response)
            .products
            .into_iter()
            .map(|hit| hit.title)
            .filter(|title| !title.is_empty())
            .take(SUGGESTION_LIMIT)
            .collect())
    }

    async fn query_endpoints(&self, pairs: &[(&str, &str)]) -> Result<SearchResponse, ApiError> {
        let mut last_error = None;
        for endpoint in SEARCH_ENDPOINTS {
            let path = with_query(endpoint, pairs);
            match self.api.json(self.api.get(&path)).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::debug!(endpoint, error = %e, "Search endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::Rejected("no search endpoint".to_owned())))
    }
}
