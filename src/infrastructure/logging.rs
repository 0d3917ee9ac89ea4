use std::fs;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Configuration for diagnostic logging. The rejection log is a separate,
/// domain-owned file and is not written through tracing.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            enable_console: true,
            enable_file: true,
            log_level: Level::INFO,
        }
    }
}

/// Initialize console and rolling-file logging with structured output.
///
/// The returned guard must be kept alive for the lifetime of the process;
/// dropping it stops the non-blocking file writer.
pub fn init_logging(
    config: Option<LoggingConfig>,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let config = config.unwrap_or_default();

    // Configure environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "customer_ingest={},sqlx=warn",
            config.log_level
        ))
    });

    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();
    let mut guard = None;

    // Console layer
    if config.enable_console {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(true);
        layers.push(Box::new(console_layer));
    }

    // Daily rolling file layer
    if config.enable_file {
        fs::create_dir_all(&config.log_dir)?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "ingest.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(false)
            .with_level(true)
            .with_ansi(false);
        layers.push(Box::new(file_layer));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    Ok(guard)
}
