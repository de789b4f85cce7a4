//! Order endpoints.

use atelier_common::AppResult;
use atelier_core::order::OrderView;
use atelier_db::entities::{order, order::OrderStatus, order_item};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Order representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<FixedOffset>,
}

impl From<order::Model> for OrderResponse {
    fn from(order: order::Model) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
        }
    }
}

/// One frozen line of an order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(item: order_item::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Order with its line items.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderViewResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderViewResponse {
    fn from(view: OrderView) -> Self {
        Self {
            order: view.order.into(),
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// List the current user's orders.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list(&user.id).await?;

    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

/// Checkout request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub basket_id: Option<String>,
}

/// Snapshot a basket into a new pending order.
async fn checkout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state
        .order_service
        .checkout(&user.id, req.basket_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(order.into()))
}

/// Get an order with its line items.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderViewResponse>> {
    let view = state.order_service.get(&user, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Pay an order, unlocking downloads for its products. Payment is a
/// stub that always succeeds.
async fn pay(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state.order_service.pay(&user, &id).await?;
    Ok(ApiResponse::ok(order.into()))
}

/// Cancel a pending order.
async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state.order_service.cancel(&user, &id).await?;
    Ok(ApiResponse::ok(order.into()))
}

/// Status update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// Move an order along the fulfilment lifecycle. Admin only.
async fn set_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state.order_service.set_status(&user, &id, req.status).await?;
    Ok(ApiResponse::ok(order.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(checkout))
        .route("/{id}", get(show))
        .route("/{id}/pay", post(pay))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/status", put(set_status))
}
