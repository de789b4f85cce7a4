//! Product repository.

use crate::entities::product::{self, ActiveModel, Column, Entity as Product};
use crate::entities::product_image::{
    self, Column as ImageColumn, Entity as ProductImage,
};
use atelier_common::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;

/// Listing filter for the product catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_trending: Option<bool>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    pub sort: ProductSort,
    pub limit: u64,
    pub offset: u64,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

/// Repository for product operations.
#[derive(Clone)]
pub struct ProductRepository {
    db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new product.
    pub async fn create(&self, model: ActiveModel) -> AppResult<product::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a product by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<product::Model>> {
        Product::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a product by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<product::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(id.to_string()))
    }

    /// List products matching a filter.
    pub async fn list(&self, filter: &ProductFilter) -> AppResult<Vec<product::Model>> {
        let mut query = Product::find();

        if let Some(ref category_id) = filter.category_id {
            query = query.filter(Column::CategoryId.eq(category_id));
        }
        if let Some(ref material) = filter.material {
            query = query.filter(Column::Material.eq(material));
        }
        if let Some(ref style) = filter.style {
            query = query.filter(Column::Style.eq(style));
        }
        if let Some(ref color) = filter.color {
            query = query.filter(Column::Color.eq(color));
        }
        if let Some(price_min) = filter.price_min {
            query = query.filter(Column::Price.gte(price_min));
        }
        if let Some(price_max) = filter.price_max {
            query = query.filter(Column::Price.lte(price_max));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(Column::IsActive.eq(is_active));
        }
        if let Some(is_trending) = filter.is_trending {
            query = query.filter(Column::IsTrending.eq(is_trending));
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                Condition::any()
                    .add(Column::Title.like(&pattern))
                    .add(Column::Description.like(&pattern)),
            );
        }

        query = match filter.sort {
            ProductSort::PriceAsc => query.order_by_asc(Column::Price),
            ProductSort::PriceDesc => query.order_by_desc(Column::Price),
            ProductSort::TitleAsc => query.order_by_asc(Column::Title),
            ProductSort::TitleDesc => query.order_by_desc(Column::Title),
        };

        query
            .limit(filter.limit)
            .offset(filter.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a product.
    pub async fn update(&self, model: ActiveModel) -> AppResult<product::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a product.
    pub async fn delete(&self, model: product::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add an image to a product's ordered gallery.
    pub async fn add_image(
        &self,
        model: product_image::ActiveModel,
    ) -> AppResult<product_image::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a product's images in display order.
    pub async fn list_images(&self, product_id: &str) -> AppResult<Vec<product_image::Model>> {
        ProductImage::find()
            .filter(ImageColumn::ProductId.eq(product_id))
            .order_by_asc(ImageColumn::Position)
            .order_by_asc(ImageColumn::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_is_price_asc() {
        let filter = ProductFilter::default();
        assert_eq!(filter.sort, ProductSort::PriceAsc);
    }
}
