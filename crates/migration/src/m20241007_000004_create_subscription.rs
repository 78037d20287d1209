//! Create `subscription` table.
//! Each row belongs to a subscriber and is removed together with it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscription::Table)
                    .if_not_exists()
                    .col(pk_auto(Subscription::Id))
                    .col(integer(Subscription::SubscriberId).not_null())
                    .col(string_len(Subscription::Service, 255).not_null())
                    .col(string_len(Subscription::Topic, 255).not_null())
                    .col(json_binary_null(Subscription::Payload))
                    .col(timestamp_with_time_zone_null(Subscription::ExpiredAt))
                    .col(timestamp_with_time_zone(Subscription::CreatedAt).default(Expr::current_timestamp()).not_null())
                    .col(timestamp_with_time_zone(Subscription::UpdatedAt).default(Expr::current_timestamp()).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_subscriber")
                            .from(Subscription::Table, Subscription::SubscriberId)
                            .to(Subscriber::Table, Subscriber::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Subscription::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Subscription {
    Table,
    Id,
    SubscriberId,
    Service,
    Topic,
    Payload,
    ExpiredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Subscriber { Table, Id }
