//! Create `chat`, `message`, `message_product` and `message_basket` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chat::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chat::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Chat::Participant1Id)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chat::Participant2Id)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chat::IsPinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Chat::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Chat::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_participant1")
                            .from(Chat::Table, Chat::Participant1Id)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_participant2")
                            .from(Chat::Table, Chat::Participant2Id)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One chat per ordered pair; `open` checks both orderings before
        // inserting, this closes the race between two concurrent opens
        manager
            .create_index(
                Index::create()
                    .name("idx_chat_participants")
                    .table(Chat::Table)
                    .col(Chat::Participant1Id)
                    .col(Chat::Participant2Id)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_participant2_id")
                    .table(Chat::Table)
                    .col(Chat::Participant2Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::ChatId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Message::MessageType)
                            .string_len(10)
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Message::Content).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_chat")
                            .from(Message::Table, Message::ChatId)
                            .to(Chat::Table, Chat::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_sender")
                            .from(Message::Table, Message::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_chat_id")
                    .table(Message::Table)
                    .col(Message::ChatId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_created_at")
                    .table(Message::Table)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MessageProduct::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageProduct::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageProduct::MessageId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageProduct::ProductId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageProduct::SelectedFormats)
                            .json_binary()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_product_message")
                            .from(MessageProduct::Table, MessageProduct::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_product_product")
                            .from(MessageProduct::Table, MessageProduct::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_product_message_id")
                    .table(MessageProduct::Table)
                    .col(MessageProduct::MessageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MessageBasket::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageBasket::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageBasket::MessageId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageBasket::BasketId)
                            .string_len(32)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_basket_message")
                            .from(MessageBasket::Table, MessageBasket::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_basket_basket")
                            .from(MessageBasket::Table, MessageBasket::BasketId)
                            .to(Basket::Table, Basket::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_basket_message_id")
                    .table(MessageBasket::Table)
                    .col(MessageBasket::MessageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_basket_basket_id")
                    .table(MessageBasket::Table)
                    .col(MessageBasket::BasketId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageBasket::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MessageProduct::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chat::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Chat {
    Table,
    Id,
    Participant1Id,
    Participant2Id,
    IsPinned,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    ChatId,
    SenderId,
    MessageType,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum MessageProduct {
    Table,
    Id,
    MessageId,
    ProductId,
    SelectedFormats,
}

#[derive(Iden)]
enum MessageBasket {
    Table,
    Id,
    MessageId,
    BasketId,
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

#[derive(Iden)]
enum Basket {
    Table,
    Id,
}
