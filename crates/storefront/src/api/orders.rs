//! Order service client.

use secrecy::SecretString;
use techmart_core::{Order, OrderId};
use tracing::instrument;

use super::{ServiceClient, authorized, with_query};
use crate::error::ApiError;
use crate::models::{NewOrder, OrderStats, OrderSummary, OrderUpdate, Page};

/// Client for the order service. Every call needs a bearer token; the
/// `admin_*` calls additionally need an admin user.
#[derive(Clone)]
pub struct OrdersClient {
    api: ServiceClient,
}

impl OrdersClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            api: ServiceClient::new(http, base_url, "orders"),
        }
    }

    /// `POST /orders/`: check out the given cart contents.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an order without items, otherwise
    /// whatever the service answers (400 for an invalid cart).
    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn create(&self, order: &NewOrder, token: &SecretString) -> Result<Order, ApiError> {
        if order.items.is_empty() {
            tracing::warn!("Refusing to create an order without items");
            return Err(ApiError::InvalidInput("order has no items".to_owned()));
        }
        let request = self.api.post("/").json(order);
        let created: Order = self.api.json(authorized(request, token)).await?;

        // The service is authoritative; a differing charge is only reported.
        let charged = created.totals();
        let quoted = order.quote(charged.discount);
        if charged != quoted {
            tracing::warn!(
                order_id = %created.id,
                charged = %charged.total,
                quoted = %quoted.total,
                "Order total differs from the cart quote"
            );
        }
        Ok(created)
    }

    /// `GET /orders/?page=&size=`: the caller's own orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token))]
    pub async fn mine(&self, page: Page, token: &SecretString) -> Result<Vec<OrderSummary>, ApiError> {
        let request = self.api.get(&with_query("/", &page_pairs(page)));
        self.api.json(authorized(request, token)).await
    }

    /// `GET /orders/{id}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 when the order does not exist or
    /// belongs to someone else.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get(&self, id: OrderId, token: &SecretString) -> Result<Order, ApiError> {
        let request = self.api.get(&id.to_string());
        self.api.json(authorized(request, token)).await
    }

    /// `GET /orders/admin/?page=&size=`: every user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 403 for non-admin tokens.
    #[instrument(skip(self, token))]
    pub async fn admin_list(
        &self,
        page: Page,
        token: &SecretString,
    ) -> Result<Vec<OrderSummary>, ApiError> {
        let request = self.api.get(&with_query("admin/", &page_pairs(page)));
        self.api.json(authorized(request, token)).await
    }

    /// `PUT /orders/admin/{id}`: change status, tracking number or notes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an update that changes nothing.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn admin_update(
        &self,
        id: OrderId,
        update: &OrderUpdate,
        token: &SecretString,
    ) -> Result<Order, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput("update changes nothing".to_owned()));
        }
        let request = self.api.put(&format!("admin/{id}")).json(update);
        self.api.json(authorized(request, token)).await
    }

    /// `GET /orders/admin/stats`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 403 for non-admin tokens.
    #[instrument(skip_all)]
    pub async fn admin_stats(&self, token: &SecretString) -> Result<OrderStats, ApiError> {
        self.api
            .json(authorized(self.api.get("admin/stats"), token))
            .await
    }
}

fn page_pairs(page: Page) -> [(&'static str, String); 2] {
    [("page", page.page.to_string()), ("size", page.size.to_string())]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
    use axum::response::IntoResponse;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use techmart_core::{Cart, OrderStatus, UserId};

    use super::*;
    use crate::api::test_support;

    fn order_json(id: i32, status: &str) -> Value {
        json!({
            "id": id,
            "user_id": 7,
            "order_number": "ORD-20250715-A1B2C3D4",
            "status": status,
            "payment_status": "pending",
            "subtotal": "50.00",
            "tax_amount": "5.00",
            "shipping_amount": "10.00",
            "discount_amount": "0.00",
            "total_amount": "65.00",
            "shipping_address": "1 Main St",
            "shipping_city": "Springfield",
            "customer_email": "ada@techmart.io",
            "created_at": "2025-07-15T10:00:00Z",
            "updated_at": "2025-07-15T10:00:00Z",
            "order_items": []
        })
    }

    async fn order_service() -> OrdersClient {
        let router = Router::new()
            .route(
                "/orders/",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["items"][0]["productId"], 301_671);
                    Json(order_json(1, "pending"))
                })
                .get(|Query(params): Query<HashMap<String, String>>| async move {
                    let size: usize = params["size"].parse().unwrap();
                    Json(
                        (1..=size)
                            .map(|i| {
                                json!({
                                    "id": i,
                                    "user_id": 7,
                                    "order_number": "ORD-20250715-A1B2C3D4",
                                    "status": "pending",
                                    "payment_status": "pending",
                                    "total_amount": "65.00",
                                    "created_at": "2025-07-15T10:00:00Z"
                                })
                            })
                            .collect::<Vec<_>>(),
                    )
                }),
            )
            .route(
                "/orders/admin/",
                get(|headers: HeaderMap| async move {
                    let is_admin = headers
                        .get(AUTHORIZATION)
                        .is_some_and(|v| v == "Bearer admin-token");
                    if is_admin {
                        Json(json!([])).into_response()
                    } else {
                        StatusCode::FORBIDDEN.into_response()
                    }
                }),
            )
            .route(
                "/orders/admin/{id}",
                put(|Path(id): Path<i32>, Json(body): Json<Value>| async move {
                    Json(order_json(id, body["status"].as_str().unwrap_or("pending")))
                }),
            )
            .route(
                "/orders/admin/stats",
                get(|| async {
                    Json(json!({
                        "total_orders": 3,
                        "pending_orders": 1,
                        "confirmed_orders": 0,
                        "processing_orders": 0,
                        "shipped_orders": 1,
                        "delivered_orders": 1,
                        "cancelled_orders": 0,
                        "total_revenue": "195.00",
                        "orders_today": 1,
                        "orders_this_month": 3
                    }))
                }),
            );
        let base = test_support::serve(router).await;
        OrdersClient::new(test_support::http(), &format!("{base}/orders"))
    }

    fn token() -> SecretString {
        SecretString::from("token-7".to_string())
    }

    fn cart() -> Cart {
        serde_json::from_value(json!({
            "userId": 7,
            "items": [{"productId": 301671, "sku": "KB-001", "title": "Keyboard", "quantity": 2, "price": 25.0}],
            "total": 50.0
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_from_cart() {
        let client = order_service().await;
        let order = client
            .create(
                &NewOrder::from_cart(&cart()).with_contact("ada@techmart.io", None),
                &token(),
            )
            .await
            .unwrap();
        assert_eq!(order.total_amount, Decimal::new(65, 0));
        assert_eq!(order.totals(), NewOrder::from_cart(&cart()).quote(Decimal::ZERO));
        assert!(order.has_well_formed_number());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_cart_locally() {
        let client = order_service().await;
        let empty = NewOrder::from_cart(&Cart::empty(UserId::new(7)));
        let err = client.create(&empty, &token()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_mine_pages() {
        let client = order_service().await;
        let orders = client.mine(Page::new(1, 3), &token()).await.unwrap();
        assert_eq!(orders.len(), 3);
    }

    #[tokio::test]
    async fn test_admin_update_and_stats() {
        let client = order_service().await;
        let update = OrderUpdate {
            status: Some(OrderStatus::Shipped),
            tracking_number: Some("1Z999".to_string()),
            ..OrderUpdate::default()
        };
        let order = client
            .admin_update(OrderId::new(4), &update, &token())
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.id, OrderId::new(4));

        let err = client
            .admin_update(OrderId::new(4), &OrderUpdate::default(), &token())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let stats = client.admin_stats(&token()).await.unwrap();
        assert_eq!(stats.total_revenue, Decimal::new(195, 0));
    }

    #[tokio::test]
    async fn test_admin_list_requires_admin_token() {
        let client = order_service().await;
        let err = client.admin_list(Page::new(1, 10), &token()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));

        let admin = SecretString::from("admin-token".to_string());
        let orders = client.admin_list(Page::new(1, 10), &admin).await.unwrap();
        assert!(orders.is_empty());
    }
}
