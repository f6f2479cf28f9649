//! Logging and tracing configuration
//!
//! Logs are controlled by the `RUST_LOG` environment variable. Default level
//! is INFO for this crate, WARN for dependencies.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("apicheck=debug,info")
        } else {
            EnvFilter::new("apicheck=info,warn")
        }
    })
}

/// Initialize tracing for the CLI (stderr logging)
pub fn init_cli(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with an additional log file
///
/// The file lives at `<data_dir>/logs/apicheck.log`. Falls back to stderr
/// only when the directory cannot be created. The returned guard must be
/// held until exit so buffered lines are flushed.
pub fn init_with_file(verbose: bool) -> (Option<PathBuf>, Option<WorkerGuard>) {
    let log_dir = match paths::ensure_log_dir() {
        Ok(Some(dir)) => dir,
        Ok(None) => {
            init_cli(verbose);
            return (None, None);
        }
        Err(e) => {
            eprintln!("Warning: Could not create log directory: {}", e);
            init_cli(verbose);
            return (None, None);
        }
    };

    let appender = tracing_appender::rolling::never(&log_dir, "apicheck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .compact();

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    (Some(log_dir.join("apicheck.log")), Some(guard))
}
