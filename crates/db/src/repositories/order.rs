//! Order repository.

use crate::entities::order::{self, ActiveModel, Column, Entity as Order, OrderStatus};
use crate::entities::order_item::{self, Column as ItemColumn, Entity as OrderItem};
use atelier_common::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// One line of an order snapshot, priced at checkout time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Repository for order operations.
#[derive(Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an order by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<order::Model>> {
        Order::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's orders, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        Order::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List an order's line items.
    pub async fn find_items(&self, order_id: &str) -> AppResult<Vec<order_item::Model>> {
        OrderItem::find()
            .filter(ItemColumn::OrderId.eq(order_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically snapshot basket lines into a new pending order and clear
    /// the source basket's items. The basket row itself survives.
    pub async fn create_from_lines(
        &self,
        order_id: String,
        item_ids: Vec<String>,
        user_id: &str,
        basket_id: &str,
        lines: Vec<OrderLine>,
        now: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> AppResult<order::Model> {
        use crate::entities::basket_item::{
            Column as BasketItemColumn, Entity as BasketItem,
        };

        let total: Decimal = lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let order = ActiveModel {
            id: Set(order_id.clone()),
            user_id: Set(user_id.to_string()),
            status: Set(OrderStatus::Pending),
            total_price: Set(total),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for (item_id, line) in item_ids.into_iter().zip(lines) {
            order_item::ActiveModel {
                id: Set(item_id),
                order_id: Set(order_id.clone()),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(line.price),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        BasketItem::delete_many()
            .filter(BasketItemColumn::BasketId.eq(basket_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(order)
    }

    /// Update an order's status.
    pub async fn set_status(
        &self,
        order: order::Model,
        status: OrderStatus,
    ) -> AppResult<order::Model> {
        let mut active: ActiveModel = order.into();
        active.status = Set(status);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
