//! Basket endpoints.

use atelier_common::AppResult;
use atelier_core::basket::{BasketAccess, BasketView};
use atelier_db::entities::basket;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Basket representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketResponse {
    pub id: String,
    pub name: String,
    pub user_id: String,
}

impl From<basket::Model> for BasketResponse {
    fn from(basket: basket::Model) -> Self {
        Self {
            id: basket.id,
            name: basket.name,
            user_id: basket.user_id,
        }
    }
}

/// One priced line in a basket.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: i32,
    pub format: Option<String>,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// Basket with items, total and access level.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketViewResponse {
    #[serde(flatten)]
    pub basket: BasketResponse,
    pub items: Vec<BasketItemResponse>,
    pub total: Decimal,
    pub read_only: bool,
}

impl From<BasketView> for BasketViewResponse {
    fn from(view: BasketView) -> Self {
        let items = view
            .items
            .into_iter()
            .map(|(item, product)| BasketItemResponse {
                id: item.id,
                product_id: item.product_id,
                quantity: item.quantity,
                format: item.format,
                title: product.as_ref().map(|p| p.title.clone()),
                price: product.as_ref().map(|p| p.price),
                image_url: product.and_then(|p| p.image_url),
            })
            .collect();

        Self {
            basket: view.basket.into(),
            items,
            total: view.total,
            read_only: view.access == BasketAccess::Shared,
        }
    }
}

/// List the current user's baskets.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<BasketResponse>>> {
    let baskets = state.basket_service.list(&user.id).await?;

    Ok(ApiResponse::ok(baskets.into_iter().map(Into::into).collect()))
}

/// Create-basket request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBasketRequest {
    pub name: Option<String>,
}

/// Create a new basket.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateBasketRequest>,
) -> AppResult<ApiResponse<BasketResponse>> {
    let basket = state.basket_service.create(&user.id, req.name).await?;
    Ok(ApiResponse::ok(basket.into()))
}

/// Get a basket with its items. Shared baskets come back read-only.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BasketViewResponse>> {
    let view = state.basket_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Rename-basket request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameBasketRequest {
    pub name: String,
}

/// Rename a basket.
async fn rename(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameBasketRequest>,
) -> AppResult<ApiResponse<BasketResponse>> {
    let basket = state.basket_service.rename(&user.id, &id, &req.name).await?;
    Ok(ApiResponse::ok(basket.into()))
}

/// Delete a basket and its items.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.basket_service.delete(&user.id, &id).await?;
    Ok(crate::response::ok())
}

/// Add-item request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub format: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Added-item response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedItemResponse {
    pub id: String,
    pub basket_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub format: Option<String>,
}

/// Add a product to a named basket, incrementing quantity when present.
async fn add_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<ApiResponse<AddedItemResponse>> {
    let item = state
        .basket_service
        .add_product(&user.id, Some(&id), &req.product_id, req.quantity, req.format)
        .await?;

    Ok(ApiResponse::ok(AddedItemResponse {
        id: item.id,
        basket_id: item.basket_id,
        product_id: item.product_id,
        quantity: item.quantity,
        format: item.format,
    }))
}

/// Add a product to the default basket, creating it on first use.
async fn add_item_default(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<ApiResponse<AddedItemResponse>> {
    let item = state
        .basket_service
        .add_product(&user.id, None, &req.product_id, req.quantity, req.format)
        .await?;

    Ok(ApiResponse::ok(AddedItemResponse {
        id: item.id,
        basket_id: item.basket_id,
        product_id: item.product_id,
        quantity: item.quantity,
        format: item.format,
    }))
}

/// Remove a product from a basket.
async fn remove_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
) -> AppResult<impl axum::response::IntoResponse> {
    state
        .basket_service
        .remove_product(&user.id, &id, &product_id)
        .await?;
    Ok(crate::response::ok())
}

/// Removed-count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedResponse {
    pub removed: u64,
}

/// Remove every item from a basket.
async fn clear(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ClearedResponse>> {
    let removed = state.basket_service.clear(&user.id, &id).await?;
    Ok(ApiResponse::ok(ClearedResponse { removed }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/items", post(add_item_default))
        .route("/{id}", get(show).patch(rename).delete(remove))
        .route("/{id}/items", post(add_item))
        .route("/{id}/items/{product_id}", axum::routing::delete(remove_item))
        .route("/{id}/clear", post(clear))
}
