//! Catalog service for categories and products.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{category, product, product_image, user},
    repositories::{CategoryRepository, ProductFilter, ProductRepository},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    category_repo: CategoryRepository,
    product_repo: ProductRepository,
    id_gen: IdGenerator,
}

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    #[validate(length(min = 1, max = 120))]
    pub slug: String,

    pub parent_id: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Input for creating a product.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub category_id: String,

    #[validate(length(max = 10_000))]
    pub description: Option<String>,

    pub price: Decimal,

    #[validate(length(max = 120))]
    pub material: Option<String>,

    #[validate(length(max = 120))]
    pub style: Option<String>,

    #[validate(length(max = 60))]
    pub color: Option<String>,

    pub is_trending: Option<bool>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Input for updating a product. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub category_id: Option<String>,

    #[validate(length(max = 10_000))]
    pub description: Option<String>,

    pub price: Option<Decimal>,

    #[validate(length(max = 120))]
    pub material: Option<String>,

    #[validate(length(max = 120))]
    pub style: Option<String>,

    #[validate(length(max = 60))]
    pub color: Option<String>,

    pub is_active: Option<bool>,
    pub is_trending: Option<bool>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// A product together with its ordered image gallery.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: product::Model,
    pub images: Vec<product_image::Model>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, product_repo: ProductRepository) -> Self {
        Self {
            category_repo,
            product_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // === Categories ===

    /// List all categories.
    pub async fn list_categories(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.list().await
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))
    }

    /// Get a category by slug.
    pub async fn get_category_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {slug}")))
    }

    /// Create a category. Admin only.
    pub async fn create_category(
        &self,
        actor: &user::Model,
        input: CreateCategoryInput,
    ) -> AppResult<category::Model> {
        ensure_admin(actor)?;
        input.validate()?;

        if self
            .category_repo
            .find_by_slug(&input.slug)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Slug already in use".to_string()));
        }

        if let Some(ref parent_id) = input.parent_id {
            self.get_category(parent_id).await?;
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            slug: Set(input.slug),
            parent_id: Set(input.parent_id),
            image_url: Set(input.image_url),
        };

        self.category_repo.create(model).await
    }

    /// Delete a category. Admin only; refused while products reference it.
    pub async fn delete_category(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        ensure_admin(actor)?;

        let category = self.get_category(id).await?;

        let product_count = self.category_repo.count_products(id).await?;
        if product_count > 0 {
            return Err(AppError::Conflict(format!(
                "Category still has {product_count} products"
            )));
        }

        self.category_repo.delete(category).await
    }

    // === Products ===

    /// List products matching a filter.
    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<product::Model>> {
        self.product_repo.list(filter).await
    }

    /// Get a product by ID.
    pub async fn get_product(&self, id: &str) -> AppResult<product::Model> {
        self.product_repo.get_by_id(id).await
    }

    /// Get a product together with its images.
    pub async fn get_product_detail(&self, id: &str) -> AppResult<ProductDetail> {
        let product = self.product_repo.get_by_id(id).await?;
        let images = self.product_repo.list_images(id).await?;
        Ok(ProductDetail { product, images })
    }

    /// Create a product. Admin only.
    pub async fn create_product(
        &self,
        actor: &user::Model,
        input: CreateProductInput,
    ) -> AppResult<product::Model> {
        ensure_admin(actor)?;
        input.validate()?;

        if input.price < Decimal::ZERO {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }

        self.get_category(&input.category_id).await?;

        let model = product::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            category_id: Set(input.category_id),
            description: Set(input.description.unwrap_or_default()),
            price: Set(input.price),
            material: Set(input.material.unwrap_or_default()),
            style: Set(input.style.unwrap_or_default()),
            color: Set(input.color.unwrap_or_default()),
            is_active: Set(true),
            is_trending: Set(input.is_trending.unwrap_or(false)),
            image_url: Set(input.image_url),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.product_repo.create(model).await
    }

    /// Update a product. Admin only.
    pub async fn update_product(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateProductInput,
    ) -> AppResult<product::Model> {
        ensure_admin(actor)?;
        input.validate()?;

        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation("Price cannot be negative".to_string()));
            }
        }
        if let Some(ref category_id) = input.category_id {
            self.get_category(category_id).await?;
        }

        let product = self.product_repo.get_by_id(id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(material) = input.material {
            active.material = Set(material);
        }
        if let Some(style) = input.style {
            active.style = Set(style);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_trending) = input.is_trending {
            active.is_trending = Set(is_trending);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.product_repo.update(active).await
    }

    /// Delete a product. Admin only.
    pub async fn delete_product(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        ensure_admin(actor)?;

        let product = self.product_repo.get_by_id(id).await?;
        self.product_repo.delete(product).await
    }

    /// Append an image to a product's gallery. Admin only.
    pub async fn add_product_image(
        &self,
        actor: &user::Model,
        product_id: &str,
        image_url: &str,
        position: i32,
    ) -> AppResult<product_image::Model> {
        ensure_admin(actor)?;

        self.product_repo.get_by_id(product_id).await?;

        let model = product_image::ActiveModel {
            id: Set(self.id_gen.generate()),
            product_id: Set(product_id.to_string()),
            image_url: Set(image_url.to_string()),
            position: Set(position),
            created_at: Set(Utc::now().into()),
        };

        self.product_repo.add_image(model).await
    }
}

fn ensure_admin(actor: &user::Model) -> AppResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn admin() -> user::Model {
        user::Model {
            id: "admin1".to_string(),
            username: "admin".to_string(),
            username_lower: "admin".to_string(),
            email: None,
            token: None,
            name: None,
            is_admin: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn regular_user() -> user::Model {
        user::Model {
            is_admin: false,
            ..admin()
        }
    }

    fn category_model(id: &str, slug: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: slug.to_string(),
            slug: slug.to_string(),
            parent_id: None,
            image_url: None,
        }
    }

    fn create_test_service(
        category_db: Arc<sea_orm::DatabaseConnection>,
        product_db: Arc<sea_orm::DatabaseConnection>,
    ) -> CatalogService {
        CatalogService::new(
            CategoryRepository::new(category_db),
            ProductRepository::new(product_db),
        )
    }

    #[tokio::test]
    async fn test_create_category_requires_admin() {
        let category_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(category_db, product_db);

        let input = CreateCategoryInput {
            name: "Chairs".to_string(),
            slug: "chairs".to_string(),
            parent_id: None,
            image_url: None,
        };

        let result = service.create_category(&regular_user(), input).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_category_rejects_duplicate_slug() {
        let category_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category_model("c1", "chairs")]])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(category_db, product_db);

        let input = CreateCategoryInput {
            name: "Chairs".to_string(),
            slug: "chairs".to_string(),
            parent_id: None,
            image_url: None,
        };

        let result = service.create_category(&admin(), input).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_category_blocked_by_products() {
        use sea_orm::MockExecResult;

        let category_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category_model("c1", "chairs")]])
                .append_query_results([[maplit_count(3)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(category_db, product_db);

        let result = service.delete_category(&admin(), "c1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    fn maplit_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }

    #[test]
    fn test_product_input_validation() {
        let input = CreateProductInput {
            title: String::new(),
            category_id: "c1".to_string(),
            description: None,
            price: Decimal::new(1999, 2),
            material: None,
            style: None,
            color: None,
            is_trending: None,
            image_url: None,
        };
        assert!(input.validate().is_err());

        let input = CreateProductInput {
            title: "Lounge chair".to_string(),
            category_id: "c1".to_string(),
            description: Some("A chair".to_string()),
            price: Decimal::new(1999, 2),
            material: Some("wood".to_string()),
            style: Some("modern".to_string()),
            color: Some("oak".to_string()),
            is_trending: Some(false),
            image_url: Some("https://cdn.example.com/p.png".to_string()),
        };
        assert!(input.validate().is_ok());
    }
}
