use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const COMPACT_FILTER: &str = "info,tower_http=info,axum=info";
// store fallbacks are logged under `service::storage`
const JSON_FILTER: &str = "info,service::storage=debug";

/// `RUST_LOG` when set and parseable, `default` otherwise.
fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Compact human-readable logs on stdout.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter_or(COMPACT_FILTER))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout, with targets kept for filtering.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter_or(JSON_FILTER))
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the output format from `LOG_FORMAT` (`json` or anything else for compact).
pub fn init_logging_from_env() {
    match std::env::var("LOG_FORMAT") {
        Ok(v) if v.eq_ignore_ascii_case("json") => init_logging_json(),
        _ => init_logging_default(),
    }
}
