//! Create `subscriber` table.
//!
//! Email addresses are unique across subscribers.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriber::Table)
                    .if_not_exists()
                    .col(pk_auto(Subscriber::Id))
                    .col(string_len(Subscriber::Email, 255).unique_key().not_null())
                    .col(string_len(Subscriber::Name, 255).not_null())
                    .col(timestamp_with_time_zone(Subscriber::CreatedAt).default(Expr::current_timestamp()).not_null())
                    .col(timestamp_with_time_zone(Subscriber::UpdatedAt).default(Expr::current_timestamp()).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Subscriber::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Subscriber { Table, Id, Email, Name, CreatedAt, UpdatedAt }
