//! Logging setup shared by the binaries.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// The log file used when none is given on the command line.
pub const DEFAULT_LOG_PATH: &str = "debug.log";

/// Log `info` and above to stdout and `debug` and above to the file at
/// `log_path`, which is appended to.
///
/// `RUST_LOG` narrows what is logged, e.g. `RUST_LOG=finance_tracker=warn`.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
///
/// # Panics
/// Panics if a global subscriber has already been set.
pub fn setup_logging(log_path: &Path) -> io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}
