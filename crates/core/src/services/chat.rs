//! Chat service for two-party conversations with attachments.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{
        chat, message, message::MessageType, message_basket, message_product, user,
    },
    repositories::{
        BasketRepository, ChatRepository, MessageRepository, ProductRepository, UserRepository,
    },
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;

/// What a message carries. Exactly one variant per message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum MessageBody {
    /// Plain text; empty text is allowed.
    Text {
        #[serde(default)]
        content: String,
    },
    /// One or more product cards, with format tags the sender picked.
    Product {
        products: Vec<ProductRef>,
        #[serde(default)]
        content: String,
    },
    /// A shared basket; the counterpart gains read-only access to it.
    Basket {
        basket_id: String,
        #[serde(default)]
        content: String,
    },
}

/// A product reference inside a product message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: String,
    #[serde(default)]
    pub selected_formats: Vec<String>,
}

/// A message with its resolved attachments.
#[derive(Debug, Clone)]
pub struct MessageDetail {
    pub message: message::Model,
    pub products: Vec<message_product::Model>,
    pub baskets: Vec<message_basket::Model>,
}

/// Listing entry for a user's chat overview.
#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub chat: chat::Model,
    pub partner: user::Model,
    pub last_message: Option<message::Model>,
    pub unread_count: u64,
}

/// Chat service.
#[derive(Clone)]
pub struct ChatService {
    chat_repo: ChatRepository,
    message_repo: MessageRepository,
    user_repo: UserRepository,
    product_repo: ProductRepository,
    basket_repo: BasketRepository,
    id_gen: IdGenerator,
}

impl ChatService {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(
        chat_repo: ChatRepository,
        message_repo: MessageRepository,
        user_repo: UserRepository,
        product_repo: ProductRepository,
        basket_repo: BasketRepository,
    ) -> Self {
        Self {
            chat_repo,
            message_repo,
            user_repo,
            product_repo,
            basket_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open (or return the existing) chat between two users.
    ///
    /// Both participant orderings are checked, so a pair can never end up
    /// with two chats.
    pub async fn open(&self, user_id: &str, other_user_id: &str) -> AppResult<chat::Model> {
        if user_id == other_user_id {
            return Err(AppError::BadRequest(
                "Cannot open a chat with yourself".to_string(),
            ));
        }

        self.user_repo.get_by_id(other_user_id).await?;

        if let Some(existing) = self.chat_repo.find_by_pair(user_id, other_user_id).await? {
            return Ok(existing);
        }

        let model = chat::ActiveModel {
            id: Set(self.id_gen.generate()),
            participant1_id: Set(user_id.to_string()),
            participant2_id: Set(other_user_id.to_string()),
            is_pinned: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.chat_repo.create(model).await
    }

    /// List a user's chats with partner, last message and unread count.
    /// Pinned chats sort first.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<ChatSummary>> {
        let chats = self.chat_repo.find_by_user(user_id).await?;

        let mut summaries = Vec::with_capacity(chats.len());
        for chat in chats {
            let partner_id = chat.other_participant(user_id).to_string();
            let Some(partner) = self.user_repo.find_by_id(&partner_id).await? else {
                continue;
            };

            let last_message = self.message_repo.find_latest_in_chat(&chat.id).await?;
            let unread_count = self.message_repo.count_unread(&chat.id, user_id).await?;

            summaries.push(ChatSummary {
                chat,
                partner,
                last_message,
                unread_count,
            });
        }

        summaries.sort_by_key(|s| !s.chat.is_pinned);

        Ok(summaries)
    }

    /// Get a chat the user participates in.
    pub async fn get(&self, user_id: &str, chat_id: &str) -> AppResult<chat::Model> {
        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chat not found: {chat_id}")))?;

        if !chat.has_participant(user_id) {
            return Err(AppError::Forbidden("Not a chat participant".to_string()));
        }

        Ok(chat)
    }

    /// Send a message into a chat.
    ///
    /// Product messages verify every referenced product; basket messages
    /// require the sender to own the basket being shared.
    pub async fn send_message(
        &self,
        sender_id: &str,
        chat_id: &str,
        body: MessageBody,
    ) -> AppResult<MessageDetail> {
        let chat = self.get(sender_id, chat_id).await?;

        let (message_type, content) = match &body {
            MessageBody::Text { content } => (MessageType::Text, content.clone()),
            MessageBody::Product { products, content } => {
                if products.is_empty() {
                    return Err(AppError::BadRequest(
                        "Product message needs at least one product".to_string(),
                    ));
                }
                for product in products {
                    self.product_repo.get_by_id(&product.product_id).await?;
                }
                (MessageType::Product, content.clone())
            }
            MessageBody::Basket { basket_id, content } => {
                let basket = self
                    .basket_repo
                    .find_by_id(basket_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Basket not found: {basket_id}")))?;
                if basket.user_id != sender_id {
                    return Err(AppError::Forbidden(
                        "Can only share your own basket".to_string(),
                    ));
                }
                (MessageType::Basket, content.clone())
            }
        };

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            chat_id: Set(chat_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            message_type: Set(message_type),
            content: Set(content),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let message = self.message_repo.create(model).await?;

        let mut products = Vec::new();
        let mut baskets = Vec::new();

        match body {
            MessageBody::Text { .. } => {}
            MessageBody::Product {
                products: refs, ..
            } => {
                for product_ref in refs {
                    let attachment = message_product::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        message_id: Set(message.id.clone()),
                        product_id: Set(product_ref.product_id),
                        selected_formats: Set(serde_json::json!(product_ref.selected_formats)),
                    };
                    products.push(self.message_repo.add_product_attachment(attachment).await?);
                }
            }
            MessageBody::Basket { basket_id, .. } => {
                let attachment = message_basket::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    message_id: Set(message.id.clone()),
                    basket_id: Set(basket_id),
                };
                baskets.push(self.message_repo.add_basket_attachment(attachment).await?);
            }
        }

        // Bump the chat so it sorts to the top of listings
        let mut active: chat::ActiveModel = chat.into();
        active.updated_at = Set(Some(Utc::now().into()));
        self.chat_repo.update(active).await?;

        Ok(MessageDetail {
            message,
            products,
            baskets,
        })
    }

    /// List a chat's messages with attachments, oldest first.
    pub async fn messages(&self, user_id: &str, chat_id: &str) -> AppResult<Vec<MessageDetail>> {
        self.get(user_id, chat_id).await?;

        let messages = self.message_repo.find_by_chat(chat_id).await?;

        let mut details = Vec::with_capacity(messages.len());
        for message in messages {
            let (products, baskets) = match message.message_type {
                MessageType::Text => (Vec::new(), Vec::new()),
                MessageType::Product => (
                    self.message_repo.find_product_attachments(&message.id).await?,
                    Vec::new(),
                ),
                MessageType::Basket => (
                    Vec::new(),
                    self.message_repo.find_basket_attachments(&message.id).await?,
                ),
            };
            details.push(MessageDetail {
                message,
                products,
                baskets,
            });
        }

        Ok(details)
    }

    /// Mark a single message as read. A sender targeting their own message
    /// is a no-op that returns the current state.
    pub async fn mark_read(&self, user_id: &str, message_id: &str) -> AppResult<message::Model> {
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message not found: {message_id}")))?;

        self.get(user_id, &message.chat_id).await?;

        if message.sender_id == user_id || message.is_read {
            return Ok(message);
        }

        self.message_repo.mark_read(message).await
    }

    /// Mark every unread message from the counterpart as read. Returns the
    /// number of messages flipped.
    pub async fn mark_chat_read(&self, user_id: &str, chat_id: &str) -> AppResult<u64> {
        self.get(user_id, chat_id).await?;
        self.message_repo.mark_chat_read(chat_id, user_id).await
    }

    /// Toggle a chat's pinned flag.
    pub async fn toggle_pin(&self, user_id: &str, chat_id: &str) -> AppResult<chat::Model> {
        let chat = self.get(user_id, chat_id).await?;

        let pinned = chat.is_pinned;
        let mut active: chat::ActiveModel = chat.into();
        active.is_pinned = Set(!pinned);

        self.chat_repo.update(active).await
    }

    /// Total unread messages across all of a user's chats.
    pub async fn unread_total(&self, user_id: &str) -> AppResult<u64> {
        let chats = self.chat_repo.find_by_user(user_id).await?;

        let mut total = 0;
        for chat in chats {
            total += self.message_repo.count_unread(&chat.id, user_id).await?;
        }

        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

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

    fn empty_service_dbs() -> (
        Arc<sea_orm::DatabaseConnection>,
        Arc<sea_orm::DatabaseConnection>,
        Arc<sea_orm::DatabaseConnection>,
        Arc<sea_orm::DatabaseConnection>,
        Arc<sea_orm::DatabaseConnection>,
    ) {
        (
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
        )
    }

    fn service(
        chat_db: Arc<sea_orm::DatabaseConnection>,
        message_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
        product_db: Arc<sea_orm::DatabaseConnection>,
        basket_db: Arc<sea_orm::DatabaseConnection>,
    ) -> ChatService {
        ChatService::new(
            ChatRepository::new(chat_db),
            MessageRepository::new(message_db),
            UserRepository::new(user_db),
            ProductRepository::new(product_db),
            BasketRepository::new(basket_db),
        )
    }

    #[tokio::test]
    async fn test_open_chat_with_self_rejected() {
        let (chat_db, message_db, user_db, product_db, basket_db) = empty_service_dbs();
        let svc = service(chat_db, message_db, user_db, product_db, basket_db);

        let result = svc.open("u1", "u1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_rejects_non_participant() {
        let chat_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[chat_model("c1", "alice", "bob")]])
                .into_connection(),
        );
        let (_, message_db, user_db, product_db, basket_db) = empty_service_dbs();
        let svc = service(chat_db, message_db, user_db, product_db, basket_db);

        let result = svc.get("carol", "c1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_mark_read_by_sender_is_noop() {
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message::Model {
                    id: "m1".to_string(),
                    chat_id: "c1".to_string(),
                    sender_id: "alice".to_string(),
                    message_type: MessageType::Text,
                    content: "hi".to_string(),
                    is_read: false,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let chat_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[chat_model("c1", "alice", "bob")]])
                .into_connection(),
        );
        let (_, _, user_db, product_db, basket_db) = empty_service_dbs();
        let svc = service(chat_db, message_db, user_db, product_db, basket_db);

        // The sender's own message comes back untouched, no update issued
        let message = svc.mark_read("alice", "m1").await.unwrap();
        assert_eq!(message.id, "m1");
        assert!(!message.is_read);
    }

    #[test]
    fn test_message_body_deserializes_tagged() {
        let body: MessageBody =
            serde_json::from_str(r#"{"type":"text","content":"hi"}"#).unwrap();
        assert!(matches!(body, MessageBody::Text { ref content } if content == "hi"));

        let body: MessageBody = serde_json::from_str(
            r#"{"type":"product","products":[{"productId":"p1","selectedFormats":[".fbx"]}]}"#,
        )
        .unwrap();
        match body {
            MessageBody::Product { products, content } => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].product_id, "p1");
                assert!(content.is_empty());
            }
            _ => panic!("Expected product body"),
        }

        let body: MessageBody =
            serde_json::from_str(r#"{"type":"basket","basketId":"b1"}"#).unwrap();
        assert!(matches!(body, MessageBody::Basket { ref basket_id, .. } if basket_id == "b1"));
    }

    #[test]
    fn test_empty_text_is_allowed() {
        let body: MessageBody = serde_json::from_str(r#"{"type":"text"}"#).unwrap();
        assert!(matches!(body, MessageBody::Text { ref content } if content.is_empty()));
    }
}
