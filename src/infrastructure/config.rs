use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub rate_limit_per_minute: usize,
    pub rejection_log_path: String,
    pub batch_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_pool_size: env_parsed("DATABASE_POOL_SIZE", defaults.database_pool_size),
            rate_limit_per_minute: env_parsed(
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            ),
            rejection_log_path: std::env::var("REJECTION_LOG_PATH")
                .unwrap_or(defaults.rejection_log_path),
            batch_path: std::env::var("BATCH_PATH").unwrap_or(defaults.batch_path),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost:5432/customers".to_string(),
            database_pool_size: 10,
            rate_limit_per_minute: 5,
            rejection_log_path: "error.log".to_string(),
            batch_path: "records.json".to_string(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
