//! Create `basket` and `basket_item` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Basket::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Basket::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Basket::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Basket::Name)
                            .string_len(255)
                            .not_null()
                            .default("Basket"),
                    )
                    .col(
                        ColumnDef::new(Basket::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Basket::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_basket_user")
                            .from(Basket::Table, Basket::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_basket_user_id")
                    .table(Basket::Table)
                    .col(Basket::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BasketItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BasketItem::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BasketItem::BasketId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(BasketItem::ProductId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BasketItem::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(BasketItem::Format).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_basket_item_basket")
                            .from(BasketItem::Table, BasketItem::BasketId)
                            .to(Basket::Table, Basket::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_basket_item_product")
                            .from(BasketItem::Table, BasketItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Backs the atomic insert-or-increment on add-product
        manager
            .create_index(
                Index::create()
                    .name("idx_basket_item_basket_product")
                    .table(BasketItem::Table)
                    .col(BasketItem::BasketId)
                    .col(BasketItem::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BasketItem::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Basket::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Basket {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BasketItem {
    Table,
    Id,
    BasketId,
    ProductId,
    Quantity,
    Format,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Product {
    Table,
    Id,
}
