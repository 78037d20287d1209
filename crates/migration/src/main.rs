use sea_orm_migration::prelude::*;

/// `DATABASE_URL=postgres://... migration up`
#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
