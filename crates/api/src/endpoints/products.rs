//! Product endpoints.

use atelier_common::AppResult;
use atelier_db::{
    entities::{product, product_image},
    repositories::{ProductFilter, ProductSort},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

/// Product representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub title: String,
    pub category_id: String,
    pub description: String,
    pub price: Decimal,
    pub material: String,
    pub style: String,
    pub color: String,
    pub is_active: bool,
    pub is_trending: bool,
    pub image_url: Option<String>,
}

impl From<product::Model> for ProductResponse {
    fn from(product: product::Model) -> Self {
        Self {
            id: product.id,
            title: product.title,
            category_id: product.category_id,
            description: product.description,
            price: product.price,
            material: product.material,
            style: product.style,
            color: product.color,
            is_active: product.is_active,
            is_trending: product.is_trending,
            image_url: product.image_url,
        }
    }
}

/// Gallery image representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageResponse {
    pub id: String,
    pub image_url: String,
    pub position: i32,
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(image: product_image::Model) -> Self {
        Self {
            id: image.id,
            image_url: image.image_url,
            position: image.position,
        }
    }
}

/// Product with its image gallery.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub images: Vec<ProductImageResponse>,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category_id: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_trending: Option<bool>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn parse_sort(sort: Option<&str>) -> ProductSort {
    match sort {
        Some("price_desc") => ProductSort::PriceDesc,
        Some("title_asc") => ProductSort::TitleAsc,
        Some("title_desc") => ProductSort::TitleDesc,
        _ => ProductSort::PriceAsc,
    }
}

/// List products matching the query.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        material: query.material,
        style: query.style,
        color: query.color,
        price_min: query.price_min,
        price_max: query.price_max,
        is_active: query.is_active,
        is_trending: query.is_trending,
        search: query.search,
        sort: parse_sort(query.sort.as_deref()),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
    };

    let products = state.catalog_service.list_products(&filter).await?;

    Ok(ApiResponse::ok(
        products.into_iter().map(Into::into).collect(),
    ))
}

/// Get a product with its image gallery.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ProductDetailResponse>> {
    let detail = state.catalog_service.get_product_detail(&id).await?;

    Ok(ApiResponse::ok(ProductDetailResponse {
        product: detail.product.into(),
        images: detail.images.into_iter().map(Into::into).collect(),
    }))
}

/// Create a product. Admin only.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<atelier_core::catalog::CreateProductInput>,
) -> AppResult<ApiResponse<ProductResponse>> {
    let product = state.catalog_service.create_product(&user, input).await?;
    Ok(ApiResponse::ok(product.into()))
}

/// Update a product. Admin only.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<atelier_core::catalog::UpdateProductInput>,
) -> AppResult<ApiResponse<ProductResponse>> {
    let product = state
        .catalog_service
        .update_product(&user, &id, input)
        .await?;
    Ok(ApiResponse::ok(product.into()))
}

/// Delete a product. Admin only.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.catalog_service.delete_product(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Add-image request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddImageRequest {
    pub image_url: String,
    #[serde(default)]
    pub position: i32,
}

/// Append an image to a product's gallery. Admin only.
async fn add_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddImageRequest>,
) -> AppResult<ApiResponse<ProductImageResponse>> {
    let image = state
        .catalog_service
        .add_product_image(&user, &id, &req.image_url, req.position)
        .await?;

    Ok(ApiResponse::ok(image.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(remove))
        .route("/{id}/images", post(add_image))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(parse_sort(Some("title_asc")), ProductSort::TitleAsc);
        assert_eq!(parse_sort(None), ProductSort::PriceAsc);
        assert_eq!(parse_sort(Some("bogus")), ProductSort::PriceAsc);
    }

    #[test]
    fn test_list_query_accepts_camel_case_filters() {
        let query: ListQuery = serde_json::from_str(
            r#"{"categoryId":"c1","isActive":false,"isTrending":true,"priceMin":"10"}"#,
        )
        .unwrap();

        assert_eq!(query.category_id.as_deref(), Some("c1"));
        assert_eq!(query.is_active, Some(false));
        assert_eq!(query.is_trending, Some(true));
        assert_eq!(query.price_min, Some(Decimal::from(10)));
    }
}
