//! Catalog deals client.
//!
//! Deals come back in the same envelope as products. They change often, so
//! nothing here is cached.

use serde::de::DeserializeOwned;
use techmart_core::{DealId, ProductId};
use tracing::instrument;

use super::products::{Envelope, limit_pair};
use super::{ServiceClient, with_query};
use crate::error::ApiError;
use crate::models::{Deal, DealFilter};

#[derive(Clone)]
pub struct DealsClient {
    api: ServiceClient,
}

impl DealsClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            api: ServiceClient::new(http, base_url, "deals"),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.api.json(self.api.get(path)).await?;
        envelope.into_data()
    }

    /// `GET /deals` with optional filters.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the envelope carries no data.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &DealFilter) -> Result<Vec<Deal>, ApiError> {
        self.fetch(&with_query("", &filter.query_pairs())).await
    }

    /// `GET /deals/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 for unknown or deleted deals.
    #[instrument(skip(self), fields(deal_id = %id))]
    pub async fn get(&self, id: DealId) -> Result<Deal, ApiError> {
        self.fetch(&id.to_string()).await
    }

    /// `GET /deals/search/{term}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank term.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, limit: Option<u32>) -> Result<Vec<Deal>, ApiError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::InvalidInput("search term is required".to_owned()));
        }
        let path = format!("search/{}", urlencoding::encode(term));
        self.fetch(&with_query(&path, &limit_pair(limit))).await
    }

    /// `GET /deals/department/{department}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn by_department(
        &self,
        department: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Deal>, ApiError> {
        let path = format!("department/{}", urlencoding::encode(department));
        self.fetch(&with_query(&path, &limit_pair(limit))).await
    }

    /// `GET /deals/product/{product_id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Deal>, ApiError> {
        self.fetch(&format!("product/{product_id}")).await
    }

    /// `GET /deals/top-rated`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn top_rated(&self, limit: Option<u32>) -> Result<Vec<Deal>, ApiError> {
        self.fetch(&with_query("top-rated", &limit_pair(limit))).await
    }

    /// `GET /deals/recent`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<Deal>, ApiError> {
        self.fetch(&with_query("recent", &limit_pair(limit))).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::extract::{Path, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::test_support;

    fn lamp() -> Value {
        json!({
            "dealId": 9241,
            "productId": 301671,
            "variantSku": "LAMP-01",
            "department": "Home",
            "title": "Desk lamp week",
            "price": 19.5,
            "originalPrice": 29.99,
            "isActive": true
        })
    }

    async fn deals_service() -> DealsClient {
        let router = Router::new()
            .route(
                "/deals",
                get(|RawQuery(query): RawQuery| async move {
                    let data = if query.as_deref() == Some("department=Home&maxPrice=20") {
                        vec![lamp()]
                    } else {
                        Vec::new()
                    };
                    Json(json!({"success": true, "count": data.len(), "data": data}))
                }),
            )
            .route(
                "/deals/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "9241" {
                        (StatusCode::OK, Json(json!({"success": true, "data": lamp()})))
                    } else {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({"success": false, "error": "Deal not found"})),
                        )
                    }
                }),
            )
            .route(
                "/deals/top-rated",
                get(|RawQuery(query): RawQuery| async move {
                    Json(json!({"success": true, "count": 0, "data": [], "message": query}))
                }),
            );
        let base = test_support::serve(router).await;
        DealsClient::new(test_support::http(), &format!("{base}/deals"))
    }

    #[tokio::test]
    async fn test_list_sends_filters_and_unwraps() {
        let client = deals_service().await;
        let filter = DealFilter {
            department: Some("Home".to_owned()),
            max_price: Some(rust_decimal::Decimal::from(20)),
            ..DealFilter::default()
        };
        let deals = client.list(&filter).await.unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].deal_id, DealId::new(9241));
    }

    #[tokio::test]
    async fn test_get_maps_missing_deal_to_status() {
        let client = deals_service().await;
        assert_eq!(client.get(DealId::new(9241)).await.unwrap().title, "Desk lamp week");
        let err = client.get(DealId::new(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_blank_search_is_rejected_locally() {
        let client = deals_service().await;
        assert!(matches!(
            client.search("  ", None).await.unwrap_err(),
            ApiError::InvalidInput(_)
        ));
        assert!(client.top_rated(Some(3)).await.unwrap().is_empty());
    }
}
