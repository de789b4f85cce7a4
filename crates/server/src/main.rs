//! Atelier server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use atelier_api::{middleware::AppState, router as api_router};
use atelier_common::Config;
use atelier_core::{
    BasketService, CatalogService, ChatService, DownloadService, MailService, OrderService,
    SubscriptionService, UserService,
};
use atelier_db::repositories::{
    BasketRepository, CategoryRepository, ChatRepository, DownloadRepository, MessageRepository,
    OrderRepository, ProductRepository, SubscriptionRepository, UserProfileRepository,
    UserRepository,
};
use axum::{Router, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting atelier server...");

    // Load .env before configuration so both sources are visible
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = atelier_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    atelier_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let product_repo = ProductRepository::new(Arc::clone(&db));
    let basket_repo = BasketRepository::new(Arc::clone(&db));
    let order_repo = OrderRepository::new(Arc::clone(&db));
    let download_repo = DownloadRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let chat_repo = ChatRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));

    // Initialize services
    let mail_service = MailService::new(config.mail.as_ref(), &config.server.url)?;
    if mail_service.is_enabled() {
        info!("SMTP mail delivery enabled");
    } else {
        info!("No mail configuration, password-reset mail disabled");
    }

    let user_service = UserService::new(
        user_repo.clone(),
        profile_repo.clone(),
        mail_service,
    );
    let catalog_service = CatalogService::new(category_repo, product_repo.clone());
    let basket_service = BasketService::new(basket_repo.clone(), product_repo.clone());
    let order_service = OrderService::new(
        order_repo,
        basket_repo.clone(),
        product_repo.clone(),
        download_repo.clone(),
    );
    let download_service = DownloadService::new(download_repo, product_repo.clone(), profile_repo);
    let subscription_service = SubscriptionService::new(subscription_repo);
    let chat_service = ChatService::new(
        chat_repo,
        message_repo,
        user_repo,
        product_repo,
        basket_repo,
    );

    // Create app state
    let state = AppState {
        user_service,
        catalog_service,
        basket_service,
        order_service,
        download_service,
        subscription_service,
        chat_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            atelier_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
