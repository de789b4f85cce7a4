//! Plan and subscription repository.

use crate::entities::plan::{self, Entity as Plan};
use crate::entities::subscription::{self, Column, Entity as Subscription};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

/// Repository for plans and time-boxed subscriptions.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Plans ===

    /// Create a plan.
    pub async fn create_plan(&self, model: plan::ActiveModel) -> AppResult<plan::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a plan by ID.
    pub async fn find_plan(&self, id: &str) -> AppResult<Option<plan::Model>> {
        Plan::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all plans.
    pub async fn list_plans(&self) -> AppResult<Vec<plan::Model>> {
        Plan::find()
            .order_by_asc(plan::Column::Price)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a plan.
    pub async fn delete_plan(&self, model: plan::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // === Subscriptions ===

    /// Create a subscription.
    pub async fn create(
        &self,
        model: subscription::ActiveModel,
    ) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's subscriptions, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::StartDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
