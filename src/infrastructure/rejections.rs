use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rejected record, as serialized into the rejection log. Entries are
/// written once and never read back by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub status: String,
    pub customer_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only rejection sink shared by every failure path in the pipeline.
///
/// Validation, rate-limit, and persistence rejections all land here, so
/// `error_count` is the single tally the orchestrator reads for batch
/// failure totals. The counter is monotonic for the lifetime of the
/// instance; construct a fresh log for fresh accounting.
#[derive(Debug)]
pub struct RejectionLog {
    file: Mutex<File>,
    path: PathBuf,
    rejections: AtomicU64,
}

impl RejectionLog {
    /// Opens (creating if absent) the log file at `path` in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open rejection log {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            rejections: AtomicU64::new(0),
        })
    }

    /// Appends one entry and bumps the rejection counter. Both happen under
    /// the writer lock so the counter always equals the number of lines
    /// written through this instance.
    pub fn record(&self, customer_id: &str, reason: &str) -> Result<()> {
        let entry = ErrorEntry {
            status: "error".to_string(),
            customer_id: customer_id.to_string(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        let line = serde_json::to_string(&entry).context("failed to serialize error entry")?;

        let mut file = lock_unpoisoned(&self.file);
        writeln!(file, "{}", line)
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        self.rejections.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    /// Total rejections recorded through this instance, across all batches.
    pub fn error_count(&self) -> u64 {
        self.rejections.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_unpoisoned<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
