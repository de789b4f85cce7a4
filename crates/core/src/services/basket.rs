//! Basket service.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{basket, basket_item, product},
    repositories::{BasketRepository, ProductRepository},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::Set;

/// How a user is allowed to see a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasketAccess {
    /// The basket belongs to the user.
    Owner,
    /// The basket was shared with the user through a chat attachment.
    Shared,
}

/// A basket together with its priced line items.
#[derive(Debug, Clone)]
pub struct BasketView {
    pub basket: basket::Model,
    pub items: Vec<(basket_item::Model, Option<product::Model>)>,
    pub total: Decimal,
    pub access: BasketAccess,
}

/// Basket service.
#[derive(Clone)]
pub struct BasketService {
    basket_repo: BasketRepository,
    product_repo: ProductRepository,
    id_gen: IdGenerator,
}

impl BasketService {
    /// Create a new basket service.
    #[must_use]
    pub const fn new(basket_repo: BasketRepository, product_repo: ProductRepository) -> Self {
        Self {
            basket_repo,
            product_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List a user's baskets.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<basket::Model>> {
        self.basket_repo.find_by_user(user_id).await
    }

    /// Create a new named basket.
    pub async fn create(&self, user_id: &str, name: Option<String>) -> AppResult<basket::Model> {
        let name = name.unwrap_or_else(|| "Basket".to_string());
        if name.is_empty() || name.len() > 255 {
            return Err(AppError::Validation("Invalid basket name".to_string()));
        }

        let model = basket::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(name),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.basket_repo.create(model).await
    }

    /// Get the user's oldest basket, creating one when none exists.
    pub async fn get_or_create_default(&self, user_id: &str) -> AppResult<basket::Model> {
        let baskets = self.basket_repo.find_by_user(user_id).await?;
        match baskets.into_iter().next() {
            Some(basket) => Ok(basket),
            None => self.create(user_id, None).await,
        }
    }

    /// Get a basket with its items and total.
    ///
    /// Owners get full access. Other users are admitted read-only when the
    /// basket was attached to a message in a chat they participate in.
    pub async fn get(&self, user_id: &str, basket_id: &str) -> AppResult<BasketView> {
        let basket = self.get_model(basket_id).await?;

        let access = if basket.user_id == user_id {
            BasketAccess::Owner
        } else if self.basket_repo.is_shared_with(basket_id, user_id).await? {
            BasketAccess::Shared
        } else {
            return Err(AppError::Forbidden("Not your basket".to_string()));
        };

        let items = self.basket_repo.find_items_with_products(basket_id).await?;
        let total = basket_total(&items);

        Ok(BasketView {
            basket,
            items,
            total,
            access,
        })
    }

    /// Add a product to a basket, incrementing quantity if already present.
    ///
    /// With no `basket_id` the user's default basket is used (created on
    /// first use).
    pub async fn add_product(
        &self,
        user_id: &str,
        basket_id: Option<&str>,
        product_id: &str,
        quantity: i32,
        format: Option<String>,
    ) -> AppResult<basket_item::Model> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let basket = match basket_id {
            Some(id) => self.get_owned(user_id, id).await?,
            None => self.get_or_create_default(user_id).await?,
        };

        self.product_repo.get_by_id(product_id).await?;

        self.basket_repo
            .upsert_item(
                self.id_gen.generate(),
                &basket.id,
                product_id,
                quantity,
                format,
            )
            .await
    }

    /// Remove a product from a basket.
    pub async fn remove_product(
        &self,
        user_id: &str,
        basket_id: &str,
        product_id: &str,
    ) -> AppResult<()> {
        self.get_owned(user_id, basket_id).await?;

        let item = self
            .basket_repo
            .find_item(basket_id, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not in basket".to_string()))?;

        self.basket_repo.delete_item(item).await
    }

    /// Remove every item from a basket. Returns the number removed.
    pub async fn clear(&self, user_id: &str, basket_id: &str) -> AppResult<u64> {
        self.get_owned(user_id, basket_id).await?;
        self.basket_repo.clear_items(basket_id).await
    }

    /// Delete a basket and its items.
    pub async fn delete(&self, user_id: &str, basket_id: &str) -> AppResult<()> {
        let basket = self.get_owned(user_id, basket_id).await?;
        self.basket_repo.delete(basket).await
    }

    /// Rename a basket.
    pub async fn rename(
        &self,
        user_id: &str,
        basket_id: &str,
        name: &str,
    ) -> AppResult<basket::Model> {
        if name.is_empty() || name.len() > 255 {
            return Err(AppError::Validation("Invalid basket name".to_string()));
        }

        let basket = self.get_owned(user_id, basket_id).await?;
        let mut active: basket::ActiveModel = basket.into();
        active.name = Set(name.to_string());
        active.updated_at = Set(Some(Utc::now().into()));

        self.basket_repo.update(active).await
    }

    /// Get a basket the user owns, or fail.
    pub async fn get_owned(&self, user_id: &str, basket_id: &str) -> AppResult<basket::Model> {
        let basket = self.get_model(basket_id).await?;
        if basket.user_id != user_id {
            return Err(AppError::Forbidden("Not your basket".to_string()));
        }
        Ok(basket)
    }

    async fn get_model(&self, basket_id: &str) -> AppResult<basket::Model> {
        self.basket_repo
            .find_by_id(basket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Basket not found: {basket_id}")))
    }
}

/// Sum of `price * quantity` over items whose product still exists.
fn basket_total(items: &[(basket_item::Model, Option<product::Model>)]) -> Decimal {
    items
        .iter()
        .filter_map(|(item, product)| {
            product
                .as_ref()
                .map(|p| p.price * Decimal::from(item.quantity))
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn item(quantity: i32) -> basket_item::Model {
        basket_item::Model {
            id: "i1".to_string(),
            basket_id: "b1".to_string(),
            product_id: "p1".to_string(),
            quantity,
            format: None,
        }
    }

    fn product(price: Decimal) -> product::Model {
        product::Model {
            id: "p1".to_string(),
            title: "Chair".to_string(),
            category_id: "c1".to_string(),
            description: String::new(),
            price,
            material: String::new(),
            style: String::new(),
            color: String::new(),
            is_active: true,
            is_trending: false,
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_basket_total() {
        let items = vec![
            (item(2), Some(product(Decimal::new(1050, 2)))),
            (item(1), Some(product(Decimal::new(500, 2)))),
        ];
        assert_eq!(basket_total(&items), Decimal::new(2600, 2));
    }

    #[test]
    fn test_basket_total_skips_missing_products() {
        let items = vec![
            (item(2), Some(product(Decimal::new(1000, 2)))),
            (item(5), None),
        ];
        assert_eq!(basket_total(&items), Decimal::new(2000, 2));
    }

    #[test]
    fn test_basket_total_empty() {
        assert_eq!(basket_total(&[]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_get_rejects_non_owner_without_share() {
        let owned_by_alice = basket::Model {
            id: "b1".to_string(),
            user_id: "alice".to_string(),
            name: "Basket".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let basket_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[owned_by_alice]])
                // no chat attachment grants bob visibility
                .append_query_results([Vec::<
                    std::collections::BTreeMap<&'static str, sea_orm::Value>,
                >::new()])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = BasketService::new(
            BasketRepository::new(basket_db),
            ProductRepository::new(product_db),
        );

        let result = service.get("bob", "b1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    fn alice_basket() -> basket::Model {
        basket::Model {
            id: "b1".to_string(),
            user_id: "alice".to_string(),
            name: "Basket".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_product_rejects_non_owner() {
        let basket_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice_basket()]])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = BasketService::new(
            BasketRepository::new(basket_db),
            ProductRepository::new(product_db),
        );

        let result = service.add_product("bob", Some("b1"), "p1", 1, None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_remove_product_rejects_non_owner() {
        let basket_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice_basket()]])
                .into_connection(),
        );
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = BasketService::new(
            BasketRepository::new(basket_db),
            ProductRepository::new(product_db),
        );

        let result = service.remove_product("bob", "b1", "p1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_add_product_accepts_inactive_product() {
        let owned = basket::Model {
            user_id: "u1".to_string(),
            ..alice_basket()
        };
        let basket_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[owned]])
                .append_query_results([[item(1)]])
                .into_connection(),
        );
        let inactive = product::Model {
            is_active: false,
            ..product(Decimal::new(1000, 2))
        };
        let product_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inactive]])
                .into_connection(),
        );

        let service = BasketService::new(
            BasketRepository::new(basket_db),
            ProductRepository::new(product_db),
        );

        let item = service.add_product("u1", Some("b1"), "p1", 1, None).await.unwrap();
        assert_eq!(item.product_id, "p1");
    }

    #[tokio::test]
    async fn test_add_product_rejects_zero_quantity() {
        let basket_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let product_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = BasketService::new(
            BasketRepository::new(basket_db),
            ProductRepository::new(product_db),
        );

        let result = service.add_product("u1", Some("b1"), "p1", 0, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
