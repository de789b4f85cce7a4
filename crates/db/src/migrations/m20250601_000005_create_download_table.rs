//! Create `download` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Download::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Download::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Download::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Download::ProductId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Download::Format).string_len(32))
                    .col(ColumnDef::new(Download::FileUrl).string_len(512))
                    .col(
                        ColumnDef::new(Download::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_download_user")
                            .from(Download::Table, Download::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_download_product")
                            .from(Download::Table, Download::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The quota counts distinct products per user; one ledger row per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_download_user_product")
                    .table(Download::Table)
                    .col(Download::UserId)
                    .col(Download::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Download::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Download {
    Table,
    Id,
    UserId,
    ProductId,
    Format,
    FileUrl,
    CreatedAt,
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
