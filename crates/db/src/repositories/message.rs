//! Message repository.

use crate::entities::message::{self, ActiveModel, Column, Entity as Message};
use crate::entities::message_basket::{self, Entity as MessageBasket};
use crate::entities::message_product::{self, Entity as MessageProduct};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;

/// Repository for message operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a chat's messages, oldest first.
    pub async fn find_by_chat(&self, chat_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(Column::ChatId.eq(chat_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the latest message in a chat.
    pub async fn find_latest_in_chat(&self, chat_id: &str) -> AppResult<Option<message::Model>> {
        Message::find()
            .filter(Column::ChatId.eq(chat_id))
            .order_by_desc(Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a chat's messages not sent by `viewer_id` and not yet read.
    pub async fn count_unread(&self, chat_id: &str, viewer_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::ChatId.eq(chat_id))
            .filter(Column::SenderId.ne(viewer_id))
            .filter(Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one message as read.
    pub async fn mark_read(&self, model: message::Model) -> AppResult<message::Model> {
        let mut active: ActiveModel = model.into();
        active.is_read = Set(true);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bulk-mark every unread message in a chat not sent by `reader_id`.
    /// Returns the number of rows flipped.
    pub async fn mark_chat_read(&self, chat_id: &str, reader_id: &str) -> AppResult<u64> {
        use sea_orm::sea_query::Expr;

        let result = Message::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::ChatId.eq(chat_id))
            .filter(Column::SenderId.ne(reader_id))
            .filter(Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    // === Attachments ===

    /// Attach a product reference to a message.
    pub async fn add_product_attachment(
        &self,
        model: message_product::ActiveModel,
    ) -> AppResult<message_product::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach a basket reference to a message.
    pub async fn add_basket_attachment(
        &self,
        model: message_basket::ActiveModel,
    ) -> AppResult<message_basket::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a message's product attachments.
    pub async fn find_product_attachments(
        &self,
        message_id: &str,
    ) -> AppResult<Vec<message_product::Model>> {
        MessageProduct::find()
            .filter(message_product::Column::MessageId.eq(message_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a message's basket attachments.
    pub async fn find_basket_attachments(
        &self,
        message_id: &str,
    ) -> AppResult<Vec<message_basket::Model>> {
        MessageBasket::find()
            .filter(message_basket::Column::MessageId.eq(message_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
