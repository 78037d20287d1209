use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::policy::PolicyTable;

use crate::auth::{Gate, JwtAuthorizer};
use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    addr.parse().with_context(|| format!("invalid bind address {addr}"))
}

/// Router for an already-built state; tests use this with an in-memory store.
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

/// Authorization pieces derived from `[auth]` and `[policy]`.
pub fn gate_and_authorizer(cfg: &AppConfig) -> Result<(Gate, Arc<JwtAuthorizer>), StartupError> {
    let authorizer = JwtAuthorizer::from_config(&cfg.auth).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let gate = Gate::new(PolicyTable::from_config(&cfg.policy));
    Ok((gate, Arc::new(authorizer)))
}

/// Public entry: connect, migrate, build the app and serve until the task is dropped.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let (gate, authorizer) = gate_and_authorizer(&cfg)?;

    let db = models::db::connect_with_config(&cfg.database).await.context("connect database")?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await.context("apply migrations")?;
        info!("migrations applied");
    }

    let state = AppState::with_database(db, gate, authorizer);
    let app = build_app(state);

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting resource hub");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
