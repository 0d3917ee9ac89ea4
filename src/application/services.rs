use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{CustomerRecord, IngestError};
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::infrastructure::rejections::RejectionLog;
use crate::infrastructure::repository::CustomerRepositoryTrait;
use crate::infrastructure::validation::RecordValidator;

/// A record as it arrives on the wire, before its timestamp is parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomerRecord {
    pub customer_id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// The batch container: one ordered sequence of raw records.
#[derive(Debug, Deserialize)]
pub struct CustomerBatch {
    pub records: Vec<RawCustomerRecord>,
}

/// Outcome of one batch run.
///
/// `success_count` is the number of records that reached the sink during
/// this call; `error_count` mirrors the shared rejection counter, which is
/// cumulative across batches on a long-lived service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub success_count: u64,
    pub error_count: u64,
}

impl BatchReport {
    pub fn total(&self) -> u64 {
        self.success_count + self.error_count
    }
}

/// The one fatal error class: a batch whose container cannot be read or
/// parsed at all. Individual record failures never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed batch container: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Drives records through parse → validate → rate-check → persist.
///
/// Owns one validator and one rate limiter for its lifetime; both accumulate
/// state across batches. All rejection paths write through the shared
/// rejection log, each exactly once.
pub struct IngestionService {
    validator: RecordValidator,
    rate_limiter: RateLimiter,
    repository: Arc<dyn CustomerRepositoryTrait>,
    rejections: Arc<RejectionLog>,
}

impl IngestionService {
    pub fn new(
        validator: RecordValidator,
        rate_limiter: RateLimiter,
        repository: Arc<dyn CustomerRepositoryTrait>,
        rejections: Arc<RejectionLog>,
    ) -> Self {
        Self {
            validator,
            rate_limiter,
            repository,
            rejections,
        }
    }

    /// Reads a batch container from disk and processes every record in it.
    /// An unreadable file or malformed container fails the whole call before
    /// any record is attempted.
    pub async fn process_batch_file(&self, path: impl AsRef<Path>) -> Result<BatchReport, BatchError> {
        let path = path.as_ref();
        let payload = tokio::fs::read(path).await?;
        let batch: CustomerBatch = serde_json::from_slice(&payload)?;

        info!("processing batch of {} records from {}", batch.records.len(), path.display());
        Ok(self.process_batch(batch.records).await)
    }

    /// Processes records in order. Failures short-circuit the record, never
    /// the batch; failure totals are read from the shared rejection counter
    /// once the batch is done.
    pub async fn process_batch(&self, records: Vec<RawCustomerRecord>) -> BatchReport {
        let mut success_count = 0u64;

        for raw in records {
            match self.process_record(raw).await {
                Ok(()) => success_count += 1,
                Err(e) => debug!("record rejected: {}", e),
            }
        }

        BatchReport {
            success_count,
            error_count: self.rejections.error_count(),
        }
    }

    /// Runs one record through the full pipeline, stopping at the first
    /// failed stage.
    pub async fn process_record(&self, raw: RawCustomerRecord) -> Result<(), IngestError> {
        // Parse failure never reaches the validator; it is logged here with
        // its own reason, distinct from the validator's missing-timestamp rule.
        let created_at = match DateTime::parse_from_rfc3339(&raw.created_at) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(_) => {
                self.reject(
                    &raw.customer_id,
                    &format!("invalid date format: {}", raw.created_at),
                );
                return Err(IngestError::InvalidTimestamp {
                    raw: raw.created_at,
                });
            }
        };

        let mut record = CustomerRecord {
            customer_id: raw.customer_id,
            email: raw.email,
            name: raw.name,
            created_at: Some(created_at),
            updated_at: None,
        };

        // The validator appends its own rejection entry; logging here again
        // would double-count.
        self.validator.validate(&mut record)?;

        if !self.rate_limiter.admit(&record.customer_id, created_at) {
            self.reject(&record.customer_id, "rate limit exceeded");
            return Err(IngestError::RateLimitExceeded);
        }

        if let Err(e) = self.repository.insert(&record).await {
            self.reject(&record.customer_id, &format!("failed to insert: {}", e));
            return Err(IngestError::Persistence(e.to_string()));
        }

        Ok(())
    }

    fn reject(&self, customer_id: &str, reason: &str) {
        if let Err(e) = self.rejections.record(customer_id, reason) {
            warn!("failed to append rejection entry for {}: {}", customer_id, e);
        }
    }
}
