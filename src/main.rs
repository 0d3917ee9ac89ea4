use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use customer_ingest::infrastructure::config::AppConfig;
use customer_ingest::infrastructure::logging::init_logging;
use customer_ingest::infrastructure::rate_limiter::{RateLimitConfig, RateLimiter};
use customer_ingest::infrastructure::rejections::RejectionLog;
use customer_ingest::infrastructure::repository::PostgresCustomerRepository;
use customer_ingest::infrastructure::validation::RecordValidator;
use customer_ingest::IngestionService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let _log_guard = init_logging(None)?;

    info!("Starting customer ingestion service");

    let config = AppConfig::from_env();

    // Start with a fresh rejection log for this run.
    if let Err(e) = std::fs::remove_file(&config.rejection_log_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove stale rejection log: {}", e);
        }
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_pool_size)
        .connect(&config.database_url)
        .await?;

    let repository = PostgresCustomerRepository::new(pool);
    repository.init().await?;

    let rejections = Arc::new(RejectionLog::open(&config.rejection_log_path)?);
    let validator = RecordValidator::new(rejections.clone());
    let rate_limiter = RateLimiter::new(RateLimitConfig {
        max_per_window: config.rate_limit_per_minute,
        ..Default::default()
    });

    let service = IngestionService::new(
        validator,
        rate_limiter,
        Arc::new(repository),
        rejections,
    );

    let report = service.process_batch_file(&config.batch_path).await?;

    info!("Total records: {}", report.total());
    info!("Successfully processed {} records", report.success_count);
    info!("Failed to process {} records", report.error_count);

    Ok(())
}
