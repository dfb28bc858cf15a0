//! HTTP route handlers for the catalog service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database)
//!
//! GET    /products                        - List (limit, search, department, category, brand, minPrice, maxPrice)
//! POST   /products                        - Create (201)
//! GET    /products/stats                  - Aggregate statistics
//! GET    /products/search/{term}          - Search (limit, mode)
//! GET    /products/department/{name}      - By department
//! GET    /products/category/{name}        - By category
//! GET    /products/brand/{name}           - By brand
//! GET    /products/price/{min}/{max}      - By price range
//! GET    /products/sku/{sku}              - By SKU
//! GET    /products/inventory/low-stock    - Low stock (threshold)
//! GET    /products/{id}                   - By id
//! PUT    /products/{id}                   - Partial update
//! DELETE /products/{id}                   - Soft delete
//! PATCH  /products/{id}/stock             - Set stock
//! DELETE /products/{id}/hard-delete       - Permanent delete
//! PATCH  /products/{id}/restore           - Undo soft delete
//!
//! GET    /deals                           - List (limit, search, department, minPrice, maxPrice)
//! POST   /deals                           - Create (201)
//! GET    /deals/stats                     - Aggregate statistics
//! GET    /deals/search/{term}             - Search
//! GET    /deals/department/{name}         - By department
//! GET    /deals/price/{min}/{max}         - By price range
//! GET    /deals/top-rated                 - Rating 4.0 and up
//! GET    /deals/product/{productId}       - By product
//! GET    /deals/recent                    - Updated in the last 30 days
//! GET    /deals/{id}                      - By deal id
//! PUT    /deals/{id}                      - Partial update
//! DELETE /deals/{id}                      - Soft delete
//! DELETE /deals/{id}/hard-delete          - Permanent delete
//! PATCH  /deals/{id}/restore              - Undo soft delete
//! ```

pub mod deals;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, patch},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/stats", get(products::stats))
        .route("/search/{term}", get(products::search))
        .route("/department/{department}", get(products::by_department))
        .route("/category/{category}", get(products::by_category))
        .route("/brand/{brand}", get(products::by_brand))
        .route("/price/{min}/{max}", get(products::by_price_range))
        .route("/sku/{sku}", get(products::by_sku))
        .route("/inventory/low-stock", get(products::low_stock))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/stock", patch(products::update_stock))
        .route("/{id}/hard-delete", delete(products::hard_delete))
        .route("/{id}/restore", patch(products::restore))
}

/// Create the deal routes router.
pub fn deal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(deals::list).post(deals::create))
        .route("/stats", get(deals::stats))
        .route("/search/{term}", get(deals::search))
        .route("/department/{department}", get(deals::by_department))
        .route("/price/{min}/{max}", get(deals::by_price_range))
        .route("/top-rated", get(deals::top_rated))
        .route("/product/{product_id}", get(deals::by_product))
        .route("/recent", get(deals::recent))
        .route(
            "/{id}",
            get(deals::get).put(deals::update).delete(deals::delete),
        )
        .route("/{id}/hard-delete", delete(deals::hard_delete))
        .route("/{id}/restore", patch(deals::restore))
}

/// Build the complete application router (without outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/deals", deal_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::store::{MemoryDealStore, MemoryProductStore};

    fn app() -> Router {
        routes().with_state(AppState::with_stores(
            Arc::new(MemoryProductStore::new()),
            Arc::new(MemoryDealStore::new()),
        ))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn keyboard() -> Value {
        json!({
            "sku": "KB-001",
            "title": "Mechanical Keyboard",
            "description": "Tactile switches",
            "price": 89.99,
            "department": "Computers",
            "category": "Keyboards",
            "brand": "Clacky",
            "stock": 12,
            "rating": 4.5
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_then_get_returns_stored_fields() {
        let app = app();
        let (status, created) = send(&app, "POST", "/products", Some(keyboard())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["success"], true);
        assert_eq!(created["message"], "Product created successfully");
        let id = created["data"]["id"].as_i64().unwrap();
        assert_eq!(id, 301_671);

        let (status, fetched) = send(&app, "GET", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"], created["data"]);
        assert_eq!(fetched["data"]["price"], json!(89.99));
        assert_eq!(fetched["data"]["isActive"], true);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let app = app();
        send(&app, "POST", "/products", Some(keyboard())).await;
        let (status, body) = send(&app, "POST", "/products", Some(keyboard())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "SKU already exists");
    }

    #[tokio::test]
    async fn test_get_missing_product_is_404() {
        let app = app();
        let (status, body) = send(&app, "GET", "/products/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("not found")
        );
    }

    #[tokio::test]
    async fn test_invalid_id_is_400() {
        let app = app();
        for uri in ["/products/abc", "/products/0", "/products/-4"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let app = app();
        let (_, created) = send(&app, "POST", "/products", Some(keyboard())).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, restored) =
            send(&app, "PATCH", &format!("/products/{id}/restore"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restored["data"]["isActive"], true);

        let (status, _) = send(&app, "DELETE", &format!("/products/{id}/hard-delete"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "PATCH", &format!("/products/{id}/restore"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_returns_single_match_with_count() {
        let app = app();
        send(&app, "POST", "/products", Some(keyboard())).await;
        send(
            &app,
            "POST",
            "/products",
            Some(json!({"sku": "MS-001", "title": "Wireless Mouse", "price": 25})),
        )
        .await;

        let (status, body) = send(&app, "GET", "/products/search/mechanical", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["sku"], "KB-001");

        let (_, body) = send(&app, "GET", "/products?search=MOUSE", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["sku"], "MS-001");
    }

    #[tokio::test]
    async fn test_unknown_search_mode_falls_back_to_substring() {
        let app = app();
        send(&app, "POST", "/products", Some(keyboard())).await;

        let (status, body) =
            send(&app, "GET", "/products/search/mechan?mode=regex", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);

        let (_, body) = send(&app, "GET", "/products/search/mechan?mode=exact", None).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_non_positive_body_id_is_rejected() {
        let app = app();
        for id in [0, -5] {
            let mut product = keyboard();
            product["id"] = json!(id);
            let (status, body) = send(&app, "POST", "/products", Some(product)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "id {id}");
            assert_eq!(body["success"], false);
        }

        let (status, created) = send(&app, "POST", "/products", Some(keyboard())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["id"], 301_671);
    }

    #[tokio::test]
    async fn test_price_range_route() {
        let app = app();
        send(&app, "POST", "/products", Some(keyboard())).await;

        let (status, body) = send(&app, "GET", "/products/price/50/100", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = send(&app, "GET", "/products/price/cheap/100", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid price range. Please provide valid numbers."
        );
    }

    #[tokio::test]
    async fn test_update_and_stock_routes() {
        let app = app();
        let (_, created) = send(&app, "POST", "/products", Some(keyboard())).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/products/{id}"),
            Some(json!({"id": 1, "title": "Quiet Keyboard"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["id"], id);
        assert_eq!(updated["data"]["title"], "Quiet Keyboard");
        assert_eq!(updated["data"]["sku"], "KB-001");

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/products/{id}/stock"),
            Some(json!({"stock": -2})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/products/{id}/stock"),
            Some(json!({"stock": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stock"], 3);

        let (_, low) = send(&app, "GET", "/products/inventory/low-stock", None).await;
        assert_eq!(low["count"], 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/products")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_route() {
        let app = app();
        send(&app, "POST", "/products", Some(keyboard())).await;
        let (status, body) = send(&app, "GET", "/products/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalProducts"], 1);
        assert_eq!(body["data"]["brands"], json!(["Clacky"]));
    }

    fn lamp_deal() -> Value {
        json!({
            "productId": 301_671,
            "variantSku": "LAMP-01-WHT",
            "department": "Home",
            "title": "Desk lamp week",
            "description": "Warm white LED",
            "price": 19.5,
            "originalPrice": 29.99,
            "discount": 35,
            "rating": 4.2
        })
    }

    #[tokio::test]
    async fn test_deal_lifecycle_routes() {
        let app = app();
        let (status, created) = send(&app, "POST", "/deals", Some(lamp_deal())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Deal created successfully");
        assert_eq!(created["data"]["dealId"], 9241);
        assert_eq!(created["data"]["price"], 19.5);

        let (status, fetched) = send(&app, "GET", "/deals/9241", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["variantSku"], "LAMP-01-WHT");

        let (status, updated) = send(
            &app,
            "PUT",
            "/deals/9241",
            Some(json!({ "dealId": 1, "price": 17.25 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["dealId"], 9241);
        assert_eq!(updated["data"]["price"], 17.25);

        let (status, _) = send(&app, "DELETE", "/deals/9241", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, missing) = send(&app, "GET", "/deals/9241", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"], "Deal not found");

        let (status, _) = send(&app, "PATCH", "/deals/9241/restore", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", "/deals/9241/hard-delete", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "PATCH", "/deals/9241/restore", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deal_listing_routes() {
        let app = app();
        send(&app, "POST", "/deals", Some(lamp_deal())).await;
        let mut chair = lamp_deal();
        chair["title"] = json!("Office chair days");
        chair["variantSku"] = json!("CHAIR-02");
        chair["department"] = json!("Furniture");
        chair["productId"] = json!(301_672);
        chair["price"] = json!(149);
        chair["rating"] = json!(3.9);
        send(&app, "POST", "/deals", Some(chair)).await;

        let (_, all) = send(&app, "GET", "/deals", None).await;
        assert_eq!(all["count"], 2);

        let (_, found) = send(&app, "GET", "/deals?search=lamp&department=Furniture", None).await;
        assert_eq!(found["count"], 1);
        assert_eq!(found["data"][0]["title"], "Desk lamp week");

        let (_, top) = send(&app, "GET", "/deals/top-rated", None).await;
        assert_eq!(top["count"], 1);

        let (_, by_product) = send(&app, "GET", "/deals/product/301672", None).await;
        assert_eq!(by_product["data"][0]["department"], "Furniture");

        let (_, cheap) = send(&app, "GET", "/deals/price/0/100", None).await;
        assert_eq!(cheap["count"], 1);
        let (status, _) = send(&app, "GET", "/deals/price/low/high", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, recent) = send(&app, "GET", "/deals/recent?limit=1", None).await;
        assert_eq!(recent["count"], 1);

        let (_, stats) = send(&app, "GET", "/deals/stats", None).await;
        assert_eq!(stats["data"]["totalDeals"], 2);
        assert_eq!(stats["data"]["uniqueProducts"], 2);
    }

    #[tokio::test]
    async fn test_deal_validation_errors_are_400() {
        let app = app();
        let mut no_product = lamp_deal();
        no_product.as_object_mut().unwrap().remove("productId");
        let (status, body) = send(&app, "POST", "/deals", Some(no_product)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, "GET", "/deals/0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
