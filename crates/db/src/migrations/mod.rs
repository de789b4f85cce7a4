//! Database migrations.

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_tables;
mod m20250601_000002_create_catalog_tables;
mod m20250601_000003_create_basket_tables;
mod m20250601_000004_create_order_tables;
mod m20250601_000005_create_download_table;
mod m20250601_000006_create_subscription_tables;
mod m20250601_000007_create_chat_tables;

/// Migration runner.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_tables::Migration),
            Box::new(m20250601_000002_create_catalog_tables::Migration),
            Box::new(m20250601_000003_create_basket_tables::Migration),
            Box::new(m20250601_000004_create_order_tables::Migration),
            Box::new(m20250601_000005_create_download_table::Migration),
            Box::new(m20250601_000006_create_subscription_tables::Migration),
            Box::new(m20250601_000007_create_chat_tables::Migration),
        ]
    }
}
