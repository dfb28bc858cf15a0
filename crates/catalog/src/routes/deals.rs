//! Deal route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Deal, DealPatch, DealStats, NewDeal};
use crate::response::ApiResponse;
use crate::services::{DealFilter, parse_deal_id, parse_product_id};
use crate::state::AppState;

use super::products::{LimitParams, json_body, parse_limit, parse_price};

type DealList = Json<ApiResponse<Vec<Deal>>>;
type SingleDeal = Json<ApiResponse<Deal>>;

/// Same leniency as the product listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealListParams {
    limit: Option<String>,
    search: Option<String>,
    department: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
}

/// `GET /deals`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<DealListParams>,
) -> Result<DealList> {
    let filter = DealFilter {
        search: params.search,
        department: params.department,
        min_price: parse_price(params.min_price.as_deref()),
        max_price: parse_price(params.max_price.as_deref()),
    };
    let deals = state
        .deals()
        .list(filter, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<DealStats>>> {
    Ok(Json(ApiResponse::ok(state.deals().stats().await?)))
}

/// `GET /deals/search/{term}`
pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let deals = state
        .deals()
        .search(&term, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/department/{department}`
pub async fn by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let deals = state
        .deals()
        .by_department(&department, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/price/{min}/{max}`
pub async fn by_price_range(
    State(state): State<AppState>,
    Path((min, max)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let (Some(min), Some(max)) = (parse_price(Some(&min)), parse_price(Some(&max))) else {
        return Err(AppError::BadRequest(
            "Invalid price range. Please provide valid numbers.".to_string(),
        ));
    };
    let deals = state
        .deals()
        .by_price_range(min, max, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/top-rated`
pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let deals = state
        .deals()
        .top_rated(parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/product/{product_id}`
pub async fn by_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let product_id = parse_product_id(&product_id)?;
    let deals = state
        .deals()
        .by_product(product_id, parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/recent`
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<DealList> {
    let deals = state
        .deals()
        .recent(parse_limit(params.limit.as_deref()))
        .await?;
    Ok(Json(ApiResponse::list(deals)))
}

/// `GET /deals/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleDeal> {
    let id = parse_deal_id(&id)?;
    Ok(Json(ApiResponse::ok(state.deals().get(id).await?)))
}

/// `POST /deals`
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewDeal>, JsonRejection>,
) -> Result<(StatusCode, SingleDeal)> {
    let deal = state.deals().create(json_body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(deal, "Deal created successfully")),
    ))
}

/// `PUT /deals/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<DealPatch>, JsonRejection>,
) -> Result<SingleDeal> {
    let id = parse_deal_id(&id)?;
    let deal = state.deals().update(id, json_body(payload)?).await?;
    Ok(Json(ApiResponse::with_message(deal, "Deal updated successfully")))
}

/// `DELETE /deals/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleDeal> {
    let id = parse_deal_id(&id)?;
    let deal = state.deals().delete(id).await?;
    Ok(Json(ApiResponse::with_message(
        deal,
        "Deal deleted successfully (soft delete)",
    )))
}

/// `DELETE /deals/{id}/hard-delete`
pub async fn hard_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<SingleDeal> {
    let id = parse_deal_id(&id)?;
    let deal = state.deals().hard_delete(id).await?;
    Ok(Json(ApiResponse::with_message(deal, "Deal permanently deleted")))
}

/// `PATCH /deals/{id}/restore`
pub async fn restore(State(state): State<AppState>, Path(id): Path<String>) -> Result<SingleDeal> {
    let id = parse_deal_id(&id)?;
    let deal = state.deals().restore(id).await?;
    Ok(Json(ApiResponse::with_message(deal, "Deal restored successfully")))
}
