//! Chat endpoints.

use atelier_common::AppResult;
use atelier_core::chat::{ChatSummary, MessageBody, MessageDetail};
use atelier_db::entities::{chat, message, message::MessageType};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    endpoints::users::UserResponse,
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Chat representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: String,
    pub participant1_id: String,
    pub participant2_id: String,
    pub is_pinned: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<chat::Model> for ChatResponse {
    fn from(chat: chat::Model) -> Self {
        Self {
            id: chat.id,
            participant1_id: chat.participant1_id,
            participant2_id: chat.participant2_id,
            is_pinned: chat.is_pinned,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Message representation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub message_type: MessageType,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<message::Model> for MessageResponse {
    fn from(message: message::Model) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            message_type: message.message_type,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

/// Product attachment on a message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageProductResponse {
    pub product_id: String,
    pub selected_formats: serde_json::Value,
}

/// Basket attachment on a message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBasketResponse {
    pub basket_id: String,
}

/// Message with its attachments.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetailResponse {
    #[serde(flatten)]
    pub message: MessageResponse,
    pub products: Vec<MessageProductResponse>,
    pub baskets: Vec<MessageBasketResponse>,
}

impl From<MessageDetail> for MessageDetailResponse {
    fn from(detail: MessageDetail) -> Self {
        Self {
            message: detail.message.into(),
            products: detail
                .products
                .into_iter()
                .map(|p| MessageProductResponse {
                    product_id: p.product_id,
                    selected_formats: p.selected_formats,
                })
                .collect(),
            baskets: detail
                .baskets
                .into_iter()
                .map(|b| MessageBasketResponse {
                    basket_id: b.basket_id,
                })
                .collect(),
        }
    }
}

/// Chat overview entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummaryResponse {
    #[serde(flatten)]
    pub chat: ChatResponse,
    pub partner: UserResponse,
    pub last_message: Option<MessageResponse>,
    pub unread_count: u64,
}

impl From<ChatSummary> for ChatSummaryResponse {
    fn from(summary: ChatSummary) -> Self {
        Self {
            chat: summary.chat.into(),
            partner: summary.partner.into(),
            last_message: summary.last_message.map(Into::into),
            unread_count: summary.unread_count,
        }
    }
}

/// List the current user's chats, pinned first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ChatSummaryResponse>>> {
    let summaries = state.chat_service.list(&user.id).await?;

    Ok(ApiResponse::ok(
        summaries.into_iter().map(Into::into).collect(),
    ))
}

/// Open-chat request.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChatRequest {
    pub user_id: String,
}

/// Open (or return the existing) chat with another user.
async fn open(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<OpenChatRequest>,
) -> AppResult<ApiResponse<ChatResponse>> {
    let chat = state.chat_service.open(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(chat.into()))
}

/// Get a chat the current user participates in.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ChatResponse>> {
    let chat = state.chat_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(chat.into()))
}

/// Toggle a chat's pinned flag.
async fn toggle_pin(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ChatResponse>> {
    let chat = state.chat_service.toggle_pin(&user.id, &id).await?;
    Ok(ApiResponse::ok(chat.into()))
}

/// List a chat's messages with attachments, oldest first.
async fn messages(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<MessageDetailResponse>>> {
    let details = state.chat_service.messages(&user.id, &id).await?;

    Ok(ApiResponse::ok(
        details.into_iter().map(Into::into).collect(),
    ))
}

/// Send a message into a chat. The body is a tagged union of text,
/// product and basket messages.
async fn send_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> AppResult<ApiResponse<MessageDetailResponse>> {
    let detail = state.chat_service.send_message(&user.id, &id, body).await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Marked-count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedReadResponse {
    pub marked: u64,
}

/// Mark every unread counterpart message in a chat as read.
async fn mark_chat_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MarkedReadResponse>> {
    let marked = state.chat_service.mark_chat_read(&user.id, &id).await?;
    Ok(ApiResponse::ok(MarkedReadResponse { marked }))
}

/// Mark a single message as read.
async fn mark_message_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state.chat_service.mark_read(&user.id, &message_id).await?;
    Ok(ApiResponse::ok(message.into()))
}

/// Unread-count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadResponse {
    pub unread: u64,
}

/// Total unread messages across all chats.
async fn unread(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadResponse>> {
    let unread = state.chat_service.unread_total(&user.id).await?;
    Ok(ApiResponse::ok(UnreadResponse { unread }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(open))
        .route("/unread", get(unread))
        .route("/messages/{message_id}/read", put(mark_message_read))
        .route("/{id}", get(show))
        .route("/{id}/pin", put(toggle_pin))
        .route("/{id}/read", post(mark_chat_read))
        .route("/{id}/messages", get(messages).post(send_message))
}
