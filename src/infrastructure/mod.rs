pub mod config;
pub mod logging;
pub mod rate_limiter;
pub mod rejections;
pub mod repository;
pub mod validation;

pub use config::AppConfig;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use rejections::{ErrorEntry, RejectionLog};
pub use repository::{CustomerRepositoryTrait, PostgresCustomerRepository, SinkError};
pub use validation::RecordValidator;
