use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A customer record after its creation timestamp has been parsed.
///
/// Records are immutable once built; the only permitted mutation afterwards
/// is the `updated_at` defaulting applied by validation. Timestamps use
/// `None` as the unset value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id: String,
    pub email: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The fixed rejection taxonomy for structural validation. Rules are checked
/// in declaration order and the first failing rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("customer_id is required")]
    MissingCustomerId,
    #[error("invalid email format")]
    InvalidEmailFormat,
    #[error("name is required")]
    MissingName,
    #[error("created_at is required")]
    MissingCreatedAt,
}

/// Why a single record was rejected by the pipeline. None of these abort the
/// surrounding batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid date format: {raw}")]
    InvalidTimestamp { raw: String },
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("failed to insert: {0}")]
    Persistence(String),
}
