//! Download ledger repository.

use crate::entities::download::{self, ActiveModel, Column, Entity as Download};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;

/// Repository for download ledger operations.
#[derive(Clone)]
pub struct DownloadRepository {
    db: Arc<DatabaseConnection>,
}

impl DownloadRepository {
    /// Create a new download repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new ledger entry.
    pub async fn create(&self, model: ActiveModel) -> AppResult<download::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a ledger entry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<download::Model>> {
        Download::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's entry for a specific product.
    pub async fn find_by_user_and_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> AppResult<Option<download::Model>> {
        Download::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's downloads, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<download::Model>> {
        Download::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the distinct products a user has downloaded.
    ///
    /// Quota enforcement counts products, not ledger rows.
    pub async fn count_distinct_products(&self, user_id: &str) -> AppResult<u64> {
        let product_ids: Vec<String> = Download::find()
            .select_only()
            .column(Column::ProductId)
            .distinct()
            .filter(Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(product_ids.len() as u64)
    }

    /// Refresh an existing entry's timestamp (re-presign of a product the
    /// user already unlocked).
    pub async fn touch(
        &self,
        model: download::Model,
        now: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> AppResult<download::Model> {
        let mut active: ActiveModel = model.into();
        active.created_at = Set(now);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a ledger entry.
    pub async fn delete(&self, model: download::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn entry(id: &str, user_id: &str, product_id: &str) -> download::Model {
        download::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            format: None,
            file_url: Some("https://cdn.example.com/p1.png".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_product() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry("d1", "u1", "p1")]])
                .into_connection(),
        );

        let repo = DownloadRepository::new(db);
        let found = repo.find_by_user_and_product("u1", "p1").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().product_id, "p1");
    }
}
