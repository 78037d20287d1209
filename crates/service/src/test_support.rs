#![cfg(test)]
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::{connect_with_config, DATABASE_URL};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Postgres tests run only when `DATABASE_URL` is set and `SKIP_DB_TESTS` is not.
pub fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

fn test_config() -> DatabaseConfig {
    DatabaseConfig { url: DATABASE_URL.to_string(), min_connections: 1, acquire_timeout_secs: 10, ..Default::default() }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_init(|| async {
            let db = connect_with_config(&test_config()).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
            drop(db);
        })
        .await;

    // Return a fresh connection for the current test's runtime
    connect_with_config(&test_config()).await
}
