//! API endpoints.

mod auth;
mod baskets;
mod categories;
mod chats;
mod downloads;
mod orders;
mod products;
mod subscriptions;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/baskets", baskets::router())
        .nest("/orders", orders::router())
        .nest("/downloads", downloads::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/chats", chats::router())
}
