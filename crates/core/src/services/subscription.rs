//! Plan and subscription service.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{plan, subscription, user},
    repositories::SubscriptionRepository,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a plan.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    pub price: Decimal,

    /// Defaults to 30 days.
    #[validate(range(min = 1, max = 3650))]
    pub duration_days: Option<i32>,
}

/// Subscription service.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(subscription_repo: SubscriptionRepository) -> Self {
        Self {
            subscription_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // === Plans ===

    /// List all plans, cheapest first.
    pub async fn list_plans(&self) -> AppResult<Vec<plan::Model>> {
        self.subscription_repo.list_plans().await
    }

    /// Get a plan by ID.
    pub async fn get_plan(&self, id: &str) -> AppResult<plan::Model> {
        self.subscription_repo
            .find_plan(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan not found: {id}")))
    }

    /// Create a plan. Admin only.
    pub async fn create_plan(
        &self,
        actor: &user::Model,
        input: CreatePlanInput,
    ) -> AppResult<plan::Model> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        input.validate()?;

        if input.price < Decimal::ZERO {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }

        let model = plan::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            price: Set(input.price),
            duration_days: Set(input.duration_days.unwrap_or(30)),
        };

        self.subscription_repo.create_plan(model).await
    }

    /// Delete a plan. Admin only.
    pub async fn delete_plan(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let plan = self.get_plan(id).await?;
        self.subscription_repo.delete_plan(plan).await
    }

    // === Subscriptions ===

    /// Subscribe a user to a plan.
    ///
    /// `end_date` defaults to `now + plan.duration_days` when not supplied.
    pub async fn subscribe(
        &self,
        user_id: &str,
        plan_id: &str,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<subscription::Model> {
        let plan = self.get_plan(plan_id).await?;

        let start = Utc::now();
        let end = end_date.unwrap_or_else(|| start + Duration::days(i64::from(plan.duration_days)));

        if end <= start {
            return Err(AppError::Validation(
                "End date must be after the start date".to_string(),
            ));
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            plan_id: Set(plan_id.to_string()),
            start_date: Set(start.into()),
            end_date: Set(end.into()),
        };

        self.subscription_repo.create(model).await
    }

    /// List a user's subscriptions, newest first.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<subscription::Model>> {
        self.subscription_repo.find_by_user(user_id).await
    }

    /// The user's currently active subscription, if any.
    pub async fn current(&self, user_id: &str) -> AppResult<Option<subscription::Model>> {
        let now = Utc::now();
        Ok(self
            .subscription_repo
            .find_by_user(user_id)
            .await?
            .into_iter()
            .find(|s| s.is_active(now)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn plan_model(id: &str, duration_days: i32) -> plan::Model {
        plan::Model {
            id: id.to_string(),
            name: "Basic".to_string(),
            price: Decimal::new(999, 2),
            duration_days,
        }
    }

    #[tokio::test]
    async fn test_subscribe_defaults_end_date_to_plan_duration() {
        let created = subscription::Model {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            plan_id: "pl1".to_string(),
            start_date: Utc::now().into(),
            end_date: (Utc::now() + Duration::days(30)).into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[plan_model("pl1", 30)]])
                .append_query_results([[created.clone()]])
                .into_connection(),
        );

        let service = SubscriptionService::new(SubscriptionRepository::new(db));

        let result = service.subscribe("u1", "pl1", None).await.unwrap();
        assert_eq!(result.plan_id, "pl1");
    }

    #[tokio::test]
    async fn test_subscribe_rejects_end_before_start() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[plan_model("pl1", 30)]])
                .into_connection(),
        );

        let service = SubscriptionService::new(SubscriptionRepository::new(db));

        let past = Utc::now() - Duration::days(1);
        let result = service.subscribe("u1", "pl1", Some(past)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_is_active_window() {
        let sub = subscription::Model {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            plan_id: "pl1".to_string(),
            start_date: Utc::now().into(),
            end_date: (Utc::now() + Duration::days(10)).into(),
        };
        assert!(sub.is_active(Utc::now()));
        assert!(!sub.is_active(Utc::now() + Duration::days(11)));
    }
}
