//! Plan and subscription endpoints.

use atelier_common::AppResult;
use atelier_db::entities::{plan, subscription};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Plan representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub duration_days: i32,
}

impl From<plan::Model> for PlanResponse {
    fn from(plan: plan::Model) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            price: plan.price,
            duration_days: plan.duration_days,
        }
    }
}

/// Subscription representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub plan_id: String,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub is_active: bool,
}

impl From<subscription::Model> for SubscriptionResponse {
    fn from(sub: subscription::Model) -> Self {
        let is_active = sub.is_active(Utc::now());
        Self {
            id: sub.id,
            plan_id: sub.plan_id,
            start_date: sub.start_date,
            end_date: sub.end_date,
            is_active,
        }
    }
}

/// List all plans, cheapest first.
async fn list_plans(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<PlanResponse>>> {
    let plans = state.subscription_service.list_plans().await?;
    Ok(ApiResponse::ok(plans.into_iter().map(Into::into).collect()))
}

/// Create a plan. Admin only.
async fn create_plan(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<atelier_core::subscription::CreatePlanInput>,
) -> AppResult<ApiResponse<PlanResponse>> {
    let plan = state.subscription_service.create_plan(&user, input).await?;
    Ok(ApiResponse::ok(plan.into()))
}

/// Delete a plan. Admin only.
async fn remove_plan(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.subscription_service.delete_plan(&user, &id).await?;
    Ok(crate::response::ok())
}

/// List the current user's subscriptions, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<SubscriptionResponse>>> {
    let subs = state.subscription_service.list(&user.id).await?;
    Ok(ApiResponse::ok(subs.into_iter().map(Into::into).collect()))
}

/// The current user's active subscription, when one exists.
async fn current(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Option<SubscriptionResponse>>> {
    let sub = state.subscription_service.current(&user.id).await?;
    Ok(ApiResponse::ok(sub.map(Into::into)))
}

/// Subscribe request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_id: String,
    pub end_date: Option<DateTime<Utc>>,
}

/// Subscribe the current user to a plan.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<ApiResponse<SubscriptionResponse>> {
    let sub = state
        .subscription_service
        .subscribe(&user.id, &req.plan_id, req.end_date)
        .await?;

    Ok(ApiResponse::ok(sub.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(subscribe))
        .route("/current", get(current))
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{id}", axum::routing::delete(remove_plan))
}
