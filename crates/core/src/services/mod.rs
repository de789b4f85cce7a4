//! Business logic services.

pub mod basket;
pub mod catalog;
pub mod chat;
pub mod download;
pub mod mail;
pub mod order;
pub mod subscription;
pub mod user;

pub use basket::BasketService;
pub use catalog::CatalogService;
pub use chat::ChatService;
pub use download::DownloadService;
pub use mail::MailService;
pub use order::OrderService;
pub use subscription::SubscriptionService;
pub use user::UserService;
