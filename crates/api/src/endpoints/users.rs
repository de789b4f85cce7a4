//! User profile endpoints.

use atelier_common::AppResult;
use atelier_db::entities::{user, user_profile};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public user representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub is_admin: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            is_admin: user.is_admin,
        }
    }
}

/// Full account view for the owner.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_admin: bool,
    pub subscription_type: user_profile::SubscriptionTier,
    pub card_number: String,
    pub card_holder: String,
    pub card_expiry: String,
    pub chat_notifications: bool,
    pub new_models_notifications: bool,
}

/// Get the current account with profile fields.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MeResponse>> {
    let profile = state.user_service.get_profile(&user.id).await?;

    Ok(ApiResponse::ok(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        name: user.name,
        is_admin: user.is_admin,
        subscription_type: profile.subscription_type,
        card_number: profile.card_number,
        card_holder: profile.card_holder,
        card_expiry: profile.card_expiry,
        chat_notifications: profile.chat_notifications,
        new_models_notifications: profile.new_models_notifications,
    }))
}

/// Update-account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Update account fields.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateMeRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let input = atelier_core::user::UpdateUserInput {
        name: req.name,
        email: req.email,
    };

    let updated = state.user_service.update(&user.id, input).await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Card update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub card_number: String,
    pub card_holder: String,
    pub card_expiry: String,
}

/// Replace the stored payment card.
async fn update_card(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCardRequest>,
) -> AppResult<ApiResponse<SuccessResponse>> {
    let input = atelier_core::user::UpdateCardInput {
        card_number: req.card_number,
        card_holder: req.card_holder,
        card_expiry: req.card_expiry,
    };

    state.user_service.update_card(&user.id, input).await?;

    Ok(ApiResponse::ok(SuccessResponse { ok: true }))
}

/// Notification preferences request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationsRequest {
    pub chat_notifications: Option<bool>,
    pub new_models_notifications: Option<bool>,
}

/// Update notification preferences.
async fn update_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateNotificationsRequest>,
) -> AppResult<ApiResponse<SuccessResponse>> {
    let input = atelier_core::user::UpdateNotificationsInput {
        chat_notifications: req.chat_notifications,
        new_models_notifications: req.new_models_notifications,
    };

    state
        .user_service
        .update_notifications(&user.id, input)
        .await?;

    Ok(ApiResponse::ok(SuccessResponse { ok: true }))
}

/// Change-password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change the account password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<SuccessResponse>> {
    let input = atelier_core::user::ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    state.user_service.change_password(&user.id, input).await?;

    Ok(ApiResponse::ok(SuccessResponse { ok: true }))
}

/// Look up a public profile by username.
async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_by_username(&username).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Generic success response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub ok: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/me/card", put(update_card))
        .route("/me/notifications", put(update_notifications))
        .route("/me/change-password", post(change_password))
        .route("/{username}", get(show))
}
