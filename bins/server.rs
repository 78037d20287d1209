use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn main() -> ExitCode {
    // .env first so RUST_LOG, DATABASE_URL and JWT_SECRET are visible
    dotenv().ok();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "server", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(cfg.server.log_format);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "server", event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    let worker_threads = cfg
        .server
        .worker_threads
        .or_else(|| std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()));

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "resource hub starting"
    );

    rt.block_on(async move {
        let server_task = tokio::spawn(server::run(cfg));

        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "server", event = "stop", %service_id, pid, "server stopped normally");
                    ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    let chain = format!("{e:#}");
                    error!(service = "server", event = "run_failed", error = %chain, "server::run returned error");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    error!(service = "server", event = "task_join_error", error = %e, "server task join error");
                    ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "server", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                ExitCode::SUCCESS
            }
        }
    })
}
