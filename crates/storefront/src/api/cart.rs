//! Cart service client.
//!
//! Every cart call is user-scoped and carries the bearer token. Mutations
//! answer with a plain-text confirmation; callers re-fetch the cart to see
//! the result.

use async_trait::async_trait;
use secrecy::SecretString;
use techmart_core::{Cart, ProductId, UserId};
use tracing::instrument;

use super::{ServiceClient, authorized, query_string};
use crate::error::ApiError;
use crate::models::{CartSummary, CartValidation};

/// Remote cart operations the cart session depends on.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// `GET /cart/{userId}`
    async fn get_cart(&self, user_id: UserId, token: &SecretString) -> Result<Cart, ApiError>;

    /// `POST /cart/items?productId=&quantity=`
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &SecretString,
    ) -> Result<String, ApiError>;

    /// `PUT /cart/items/{productId}?quantity=`
    async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &SecretString,
    ) -> Result<String, ApiError>;

    /// `DELETE /cart/items/{productId}`
    async fn remove_item(
        &self,
        product_id: ProductId,
        token: &SecretString,
    ) -> Result<String, ApiError>;

    /// `DELETE /cart`
    async fn clear(&self, token: &SecretString) -> Result<String, ApiError>;
}

/// Client for the cart service.
#[derive(Clone)]
pub struct CartClient {
    api: ServiceClient,
}

impl CartClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            api: ServiceClient::new(http, base_url, "cart"),
        }
    }

    /// `GET /cart/summary`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 401 for a missing or expired token.
    #[instrument(skip_all)]
    pub async fn summary(&self, token: &SecretString) -> Result<CartSummary, ApiError> {
        self.api
            .json(authorized(self.api.get("summary"), token))
            .await
    }

    /// `GET /cart/validate`. An invalid cart is `Ok` with `valid: false`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 401 for a missing or expired token.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &SecretString) -> Result<CartValidation, ApiError> {
        self.api
            .json(authorized(self.api.get("validate"), token))
            .await
    }
}

#[async_trait]
impl CartApi for CartClient {
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    async fn get_cart(&self, user_id: UserId, token: &SecretString) -> Result<Cart, ApiError> {
        self.api
            .json(authorized(self.api.get(&user_id.to_string()), token))
            .await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &SecretString,
    ) -> Result<String, ApiError> {
        let query = query_string(&[
            ("productId", product_id.to_string()),
            ("quantity", quantity.to_string()),
        ]);
        // The item travels in the query; the body is an empty object
        let request = self
            .api
            .post(&format!("items?{query}"))
            .json(&serde_json::json!({}));
        self.api.text(authorized(request, token)).await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &SecretString,
    ) -> Result<String, ApiError> {
        let request = self
            .api
            .put(&format!("items/{product_id}?quantity={quantity}"))
            .json(&serde_json::json!({}));
        self.api.text(authorized(request, token)).await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn remove_item(
        &self,
        product_id: ProductId,
        token: &SecretString,
    ) -> Result<String, ApiError> {
        let request = self.api.delete(&format!("items/{product_id}"));
        self.api.text(authorized(request, token)).await
    }

    #[instrument(skip_all)]
    async fn clear(&self, token: &SecretString) -> Result<String, ApiError> {
        self.api.text(authorized(self.api.delete(""), token)).await
    }
}
