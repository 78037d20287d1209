//! Migrator registering entity migrations in dependency order.
//! Parents before children; indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20241007_000001_create_category;
mod m20241007_000002_create_product;
mod m20241007_000003_create_subscriber;
mod m20241007_000004_create_subscription;
mod m20241007_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241007_000001_create_category::Migration),
            Box::new(m20241007_000002_create_product::Migration),
            Box::new(m20241007_000003_create_subscriber::Migration),
            Box::new(m20241007_000004_create_subscription::Migration),
            // Indexes should always be applied last
            Box::new(m20241007_000005_add_indexes::Migration),
        ]
    }
}
