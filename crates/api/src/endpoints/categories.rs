//! Category endpoints.

use atelier_common::AppResult;
use atelier_db::entities::category;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Category representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub image_url: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            parent_id: category.parent_id,
            image_url: category.image_url,
        }
    }
}

/// List all categories.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<CategoryResponse>>> {
    let categories = state.catalog_service.list_categories().await?;

    Ok(ApiResponse::ok(
        categories.into_iter().map(Into::into).collect(),
    ))
}

/// Get a category by slug, falling back to ID lookup.
async fn show(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = match state.catalog_service.get_category_by_slug(&key).await {
        Ok(category) => category,
        Err(_) => state.catalog_service.get_category(&key).await?,
    };
    Ok(ApiResponse::ok(category.into()))
}

/// Create-category request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub image_url: Option<String>,
}

/// Create a category. Admin only.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let input = atelier_core::catalog::CreateCategoryInput {
        name: req.name,
        slug: req.slug,
        parent_id: req.parent_id,
        image_url: req.image_url,
    };

    let category = state.catalog_service.create_category(&user, input).await?;

    Ok(ApiResponse::ok(category.into()))
}

/// Delete a category. Admin only; fails while products reference it.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.catalog_service.delete_category(&user, &id).await?;
    Ok(crate::response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).delete(remove))
}
