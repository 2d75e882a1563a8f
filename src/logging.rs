use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "patient_records=info,tower_http=info";

/// Initializes the logging system with console output and, when configured,
/// a JSON file layer with daily rotation.
///
/// The returned guard flushes the file writer on drop; hold it until exit.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    // Respect RUST_LOG if set; otherwise default to info for our crate
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout);

    let (file_layer, guard) = if config.json_file && fs::create_dir_all(&config.directory).is_ok()
    {
        let file_appender =
            tracing_appender::rolling::daily(&config.directory, "patient_records.log");
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer().json().with_writer(non_blocking_writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // try_init so a second call (e.g. from tests) is a no-op instead of a panic
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
