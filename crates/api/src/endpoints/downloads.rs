//! Download endpoints.

use atelier_common::AppResult;
use atelier_db::entities::download;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Download ledger entry representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub id: String,
    pub product_id: String,
    pub format: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<download::Model> for DownloadResponse {
    fn from(download: download::Model) -> Self {
        Self {
            id: download.id,
            product_id: download.product_id,
            format: download.format,
            file_url: download.file_url,
            created_at: download.created_at,
        }
    }
}

/// List the current user's downloads.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DownloadResponse>>> {
    let downloads = state.download_service.list(&user.id).await?;

    Ok(ApiResponse::ok(
        downloads.into_iter().map(Into::into).collect(),
    ))
}

/// Remaining-quota response. `remaining` is absent for unlimited tiers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingResponse {
    pub remaining: Option<u64>,
}

/// Quota slots the current user has left.
async fn remaining(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RemainingResponse>> {
    let remaining = state.download_service.remaining(&user.id).await?;
    Ok(ApiResponse::ok(RemainingResponse { remaining }))
}

/// Presign request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub product_id: String,
    pub format: Option<String>,
}

/// Presign response. `remaining_downloads` is null for unlimited tiers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub download_id: String,
    pub url: Option<String>,
    pub remaining_downloads: Option<u64>,
}

/// Unlock a product download, consuming one quota slot for new products.
async fn presign(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PresignRequest>,
) -> AppResult<ApiResponse<PresignResponse>> {
    let result = state
        .download_service
        .presign(&user.id, &req.product_id, req.format)
        .await?;

    Ok(ApiResponse::ok(PresignResponse {
        download_id: result.download.id,
        url: result.download.file_url,
        remaining_downloads: result.remaining,
    }))
}

/// Delete a ledger entry, freeing its quota slot.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.download_service.delete(&user.id, &id).await?;
    Ok(crate::response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/presign", post(presign))
        .route("/remaining", get(remaining))
        .route("/{id}", axum::routing::delete(remove))
}
