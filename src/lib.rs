pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{BatchError, BatchReport, IngestionService, RawCustomerRecord};
pub use domain::{CustomerRecord, IngestError, ValidationFailure};
pub use infrastructure::repository::CustomerRepositoryTrait;
pub use infrastructure::{
    AppConfig, PostgresCustomerRepository, RateLimitConfig, RateLimiter, RecordValidator,
    RejectionLog,
};
