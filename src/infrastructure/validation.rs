use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::{CustomerRecord, ValidationFailure};
use crate::infrastructure::rejections::RejectionLog;

/// Structural validation over a single record.
///
/// Stateless apart from the shared rejection sink: every failure is appended
/// there before it is returned, so callers must not log it again.
pub struct RecordValidator {
    rejections: Arc<RejectionLog>,
}

impl RecordValidator {
    pub fn new(rejections: Arc<RejectionLog>) -> Self {
        Self { rejections }
    }

    /// Checks the rules in fixed precedence order; the first failing rule
    /// wins and later rules are not evaluated. On success, an unset
    /// `updated_at` is stamped with the current time.
    pub fn validate(&self, record: &mut CustomerRecord) -> Result<(), ValidationFailure> {
        if let Err(failure) = check(record) {
            self.reject(&record.customer_id, failure);
            return Err(failure);
        }

        if record.updated_at.is_none() {
            record.updated_at = Some(Utc::now());
        }

        Ok(())
    }

    fn reject(&self, customer_id: &str, failure: ValidationFailure) {
        if let Err(e) = self.rejections.record(customer_id, &failure.to_string()) {
            warn!("failed to append rejection entry for {}: {}", customer_id, e);
        }
    }
}

fn check(record: &CustomerRecord) -> Result<(), ValidationFailure> {
    if record.customer_id.is_empty() {
        return Err(ValidationFailure::MissingCustomerId);
    }
    if !is_valid_email(&record.email) {
        return Err(ValidationFailure::InvalidEmailFormat);
    }
    if record.name.is_empty() {
        return Err(ValidationFailure::MissingName);
    }
    if record.created_at.is_none() {
        return Err(ValidationFailure::MissingCreatedAt);
    }
    Ok(())
}

/// Restricted email grammar: local part over `[a-z0-9._%+-]`, a domain over
/// `[a-z0-9.-]`, a literal dot, and a final label of 2-4 lowercase letters.
/// Deliberately narrower than RFC 5322; uppercase input does not match.
fn is_valid_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    // The final label cannot contain a dot, so the label separator is the
    // last dot in the host.
    let Some((domain, label)) = host.rsplit_once('.') else {
        return false;
    };

    !local.is_empty()
        && local
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'%' | b'+' | b'-'))
        && !domain.is_empty()
        && domain
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-'))
        && (2..=4).contains(&label.len())
        && label.bytes().all(|b| b.is_ascii_lowercase())
}
