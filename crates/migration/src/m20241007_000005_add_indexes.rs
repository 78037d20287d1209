use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const LIST_ORDER_INDEXES: [(&str, Tables); 4] = [
    ("idx_category_created_at", Tables::Category),
    ("idx_product_created_at", Tables::Product),
    ("idx_subscriber_created_at", Tables::Subscriber),
    ("idx_subscription_created_at", Tables::Subscription),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Lists are ordered by created_at DESC
        for (name, table) in LIST_ORDER_INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(Tables::CreatedAt)
                        .to_owned(),
                )
                .await?;
        }

        // Child lookups when eager-loading a parent's collection
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category")
                    .table(Tables::Product)
                    .col(Tables::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_subscriber")
                    .table(Tables::Subscription)
                    .col(Tables::SubscriberId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in LIST_ORDER_INDEXES {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        manager
            .drop_index(Index::drop().name("idx_product_category").table(Tables::Product).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_subscription_subscriber").table(Tables::Subscription).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Tables {
    Category,
    Product,
    Subscriber,
    Subscription,
    CreatedAt,
    CategoryId,
    SubscriberId,
}
