//! Database entities.

pub mod basket;
pub mod basket_item;
pub mod category;
pub mod chat;
pub mod download;
pub mod message;
pub mod message_basket;
pub mod message_product;
pub mod order;
pub mod order_item;
pub mod plan;
pub mod product;
pub mod product_image;
pub mod subscription;
pub mod user;
pub mod user_profile;
