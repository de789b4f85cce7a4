//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use atelier_core::{
    BasketService, CatalogService, ChatService, DownloadService, OrderService,
    SubscriptionService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub basket_service: BasketService,
    pub order_service: OrderService,
    pub download_service: DownloadService,
    pub subscription_service: SubscriptionService,
    pub chat_service: ChatService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user and stashes it in request
/// extensions; endpoints opt in through the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
