//! Repository layer.

mod basket;
mod category;
mod chat;
mod download;
mod message;
mod order;
mod product;
mod subscription;
mod user;
mod user_profile;

pub use basket::BasketRepository;
pub use category::CategoryRepository;
pub use chat::ChatRepository;
pub use download::DownloadRepository;
pub use message::MessageRepository;
pub use order::{OrderLine, OrderRepository};
pub use product::{ProductFilter, ProductRepository, ProductSort};
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
