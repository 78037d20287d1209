use std::io;

use configs::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,sea_orm=warn,sqlx=warn";

/// Initialize the global tracing subscriber.
/// - Respects `RUST_LOG` if set, otherwise `info` with quiet SQL crates
/// - Writes to stdout so container runtimes collect it alongside request logs
/// - Safe to call more than once; later calls are no-ops
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Compact human-readable logs; used before configuration is available.
pub fn init_logging_default() {
    init_logging(LogFormat::Compact);
}
