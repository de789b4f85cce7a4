//! Basket repository.

use crate::entities::basket::{self, ActiveModel, Column, Entity as Basket};
use crate::entities::basket_item::{
    self, Column as ItemColumn, Entity as BasketItem,
};
use crate::entities::product;
use atelier_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;

/// Repository for basket operations.
#[derive(Clone)]
pub struct BasketRepository {
    db: Arc<DatabaseConnection>,
}

impl BasketRepository {
    /// Create a new basket repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new basket.
    pub async fn create(&self, model: ActiveModel) -> AppResult<basket::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a basket by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<basket::Model>> {
        Basket::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's baskets, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<basket::Model>> {
        Basket::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a basket.
    pub async fn update(&self, model: ActiveModel) -> AppResult<basket::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a basket; its items cascade at the database level.
    pub async fn delete(&self, model: basket::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert-or-increment a basket line item in a single statement.
    ///
    /// On conflict of (basket_id, product_id) the existing row's quantity
    /// is incremented by `quantity`, so two concurrent adds for the same
    /// product cannot produce duplicate rows.
    pub async fn upsert_item(
        &self,
        item_id: String,
        basket_id: &str,
        product_id: &str,
        quantity: i32,
        format: Option<String>,
    ) -> AppResult<basket_item::Model> {
        let model = basket_item::ActiveModel {
            id: Set(item_id),
            basket_id: Set(basket_id.to_string()),
            product_id: Set(product_id.to_string()),
            quantity: Set(quantity),
            format: Set(format),
        };

        BasketItem::insert(model)
            .on_conflict(
                OnConflict::columns([ItemColumn::BasketId, ItemColumn::ProductId])
                    .value(
                        ItemColumn::Quantity,
                        Expr::col((BasketItem, ItemColumn::Quantity)).add(quantity),
                    )
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a line item by basket and product.
    pub async fn find_item(
        &self,
        basket_id: &str,
        product_id: &str,
    ) -> AppResult<Option<basket_item::Model>> {
        BasketItem::find()
            .filter(ItemColumn::BasketId.eq(basket_id))
            .filter(ItemColumn::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a line item.
    pub async fn delete_item(&self, model: basket_item::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a basket's items together with their products.
    pub async fn find_items_with_products(
        &self,
        basket_id: &str,
    ) -> AppResult<Vec<(basket_item::Model, Option<product::Model>)>> {
        BasketItem::find()
            .filter(ItemColumn::BasketId.eq(basket_id))
            .find_also_related(product::Entity)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all items from a basket, returning the number removed.
    pub async fn clear_items(&self, basket_id: &str) -> AppResult<u64> {
        let result = BasketItem::delete_many()
            .filter(ItemColumn::BasketId.eq(basket_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Whether a basket was ever attached to a message in a chat the user
    /// participates in. Grants read-only visibility to non-owners.
    pub async fn is_shared_with(&self, basket_id: &str, user_id: &str) -> AppResult<bool> {
        use sea_orm::{ConnectionTrait, Statement};

        let sql = r"
            SELECT mb.id FROM message_basket mb
            JOIN message m ON m.id = mb.message_id
            JOIN chat c ON c.id = m.chat_id
            WHERE mb.basket_id = $1
              AND (c.participant1_id = $2 OR c.participant2_id = $2)
            LIMIT 1
        ";

        let result = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                sql,
                [basket_id.into(), user_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_upsert_item_issues_single_increment_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[basket_item::Model {
                    id: "i1".to_string(),
                    basket_id: "b1".to_string(),
                    product_id: "p1".to_string(),
                    quantity: 3,
                    format: None,
                }]])
                .into_connection(),
        );

        let repo = BasketRepository::new(Arc::clone(&db));
        let item = repo
            .upsert_item("i1".to_string(), "b1", "p1", 2, None)
            .await
            .unwrap();
        assert_eq!(item.quantity, 3);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let statement = log[0].statements()[0].sql.clone();
        assert!(statement.contains("ON CONFLICT"));
        assert!(statement.contains(r#""quantity" = "basket_item"."quantity" +"#));
    }
}
