//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{NewProduct, Product, ProductPatch, ProductStats, StockUpdate};
use crate::response::ApiResponse;
use crate::search::MatchMode;
use crate::services::{ListFilter, parse_product_id};
use crate::state::AppState;

type ProductList = Json<ApiResponse<Vec<Product>>>;
type SingleProduct = Json<ApiResponse<Product>>;

/// Query parameters are taken as text and parsed leniently: an unparsable
/// `limit` falls back to the default, as does an unparsable price bound.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    limit: Option<String>,
    search: Option<String>,
    department: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub(super) limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    limit: Option<String>,
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockParams {
    threshold: Option<String>,
}

pub(super) fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Unknown modes fall back to substring matching.
fn parse_mode(raw: Option<&str>) -> MatchMode {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("exact") => MatchMode::Exact,
        Some("fulltext") => MatchMode::FullText,
        _ => MatchMode::Substring,
    }
}

pub(super) fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw.and_then(|s| s.trim().parse().ok())
}

pub(super) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// `GET /products`
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<ProductList> {
    let filter = ListFilter {
        search: params.search,
        department: params.department,
        category: params.category,
        brand: params.brand,
        min_price: parse_price(params.min_price.as_deref()),
        max_price: parse_price(params.max_price.as_deref()),
    };
    let products = state
        .catalog()
        .list(filter, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<ProductStats>>> {
    Ok(Json(ApiResponse::ok(state.catalog().stats().await?)))
}

/// `GET /products/search/{term}`
pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<ProductList> {
    let products = state
        .catalog()
        .search(
            &term,
            parse_limit(params.limit.as_deref()),
            parse_mode(params.mode.as_deref()),
        )
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/department/{department}`
pub async fn by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<ProductList> {
    let products = state
        .catalog()
        .by_department(&department, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/category/{category}`
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<ProductList> {
    let products = state
        .catalog()
        .by_category(&category, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/brand/{brand}`
pub async fn by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<ProductList> {
    let products = state
        .catalog()
        .by_brand(&brand, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/price/{min}/{max}`
pub async fn by_price_range(
    State(state): State<AppState>,
    Path((min, max)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> Result<ProductList> {
    let (Some(min), Some(max)) = (parse_price(Some(&min)), parse_price(Some(&max))) else {
        return Err(AppError::BadRequest(
            "Invalid price range. Please provide valid numbers.".to_string(),
        ));
    };
    let products = state
        .catalog()
        .by_price_range(min, max, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/sku/{sku}`
pub async fn by_sku(State(state): State<AppState>, Path(sku): Path<String>) -> Result<SingleProduct> {
    Ok(Json(ApiResponse::ok(state.catalog().get_by_sku(&sku).await?)))
}

/// `GET /products/inventory/low-stock`
pub async fn low_stock(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<ProductList> {
    let threshold = params
        .threshold
        .as_deref()
        .and_then(|s| s.trim().parse().ok());
    let products = state.catalog().low_stock(threshold).await?;
    Ok(Json(ApiResponse::list(products)))
}

/// `GET /products/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    Ok(Json(ApiResponse::ok(state.catalog().get(id).await?)))
}

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, SingleProduct)> {
    let product = state.catalog().create(json_body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(product, "Product created successfully")),
    ))
}

/// `PUT /products/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ProductPatch>, JsonRejection>,
) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().update(id, json_body(payload)?).await?;
    Ok(Json(ApiResponse::with_message(
        product,
        "Product updated successfully",
    )))
}

/// `DELETE /products/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().delete(id).await?;
    Ok(Json(ApiResponse::with_message(
        product,
        "Product deleted successfully (soft delete)",
    )))
}

/// `PATCH /products/{id}/stock`
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<StockUpdate>, JsonRejection>,
) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    let StockUpdate { stock } = json_body(payload)?;
    let product = state.catalog().update_stock(id, stock).await?;
    Ok(Json(ApiResponse::with_message(
        product,
        "Stock updated successfully",
    )))
}

/// `DELETE /products/{id}/hard-delete`
pub async fn hard_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().hard_delete(id).await?;
    Ok(Json(ApiResponse::with_message(
        product,
        "Product permanently deleted",
    )))
}

/// `PATCH /products/{id}/restore`
pub async fn restore(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleProduct> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().restore(id).await?;
    Ok(Json(ApiResponse::with_message(
        product,
        "Product restored successfully",
    )))
}
