//! Chat repository.

use crate::entities::chat::{self, ActiveModel, Column, Entity as Chat};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

/// Repository for chat operations.
#[derive(Clone)]
pub struct ChatRepository {
    db: Arc<DatabaseConnection>,
}

impl ChatRepository {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new chat.
    pub async fn create(&self, model: ActiveModel) -> AppResult<chat::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a chat by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<chat::Model>> {
        Chat::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a chat for a pair of users, checking both participant orderings.
    pub async fn find_by_pair(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<chat::Model>> {
        Chat::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(Column::Participant1Id.eq(user_a))
                            .add(Column::Participant2Id.eq(user_b)),
                    )
                    .add(
                        Condition::all()
                            .add(Column::Participant1Id.eq(user_b))
                            .add(Column::Participant2Id.eq(user_a)),
                    ),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's chats, most recently updated first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<chat::Model>> {
        Chat::find()
            .filter(
                Condition::any()
                    .add(Column::Participant1Id.eq(user_id))
                    .add(Column::Participant2Id.eq(user_id)),
            )
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a chat.
    pub async fn update(&self, model: ActiveModel) -> AppResult<chat::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn chat_model(id: &str, a: &str, b: &str) -> chat::Model {
        chat::Model {
            id: id.to_string(),
            participant1_id: a.to_string(),
            participant2_id: b.to_string(),
            is_pinned: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_returns_existing() {
        let existing = chat_model("c1", "alice", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()]])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        // Reversed argument order must still match the stored (alice, bob) row.
        let found = repo.find_by_pair("bob", "alice").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, "c1");
    }
}
