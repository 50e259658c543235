use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directory logs roll into, honoring the RAILYARD_LOG_DIR override.
fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RAILYARD_LOG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".railyard/logs")
}

/// Initialize tracing for one pipeline component.
///
/// Logs roll daily into `<log dir>/<component>.log.<date>`; the returned
/// guard must stay alive for the non-blocking writer to flush. The filter
/// comes from RUST_LOG, defaulting to `info`. Interactive embedders pass
/// `to_stderr` to mirror events onto the terminal.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    let dir = log_dir();
    let _ = std::fs::create_dir_all(&dir);

    let file_appender = tracing_appender::rolling::daily(&dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact();
        registry.with(stderr_layer).init();
    } else {
        registry.init();
    }

    guard
}
