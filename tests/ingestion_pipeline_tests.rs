use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use tempfile::TempDir;

use customer_ingest::infrastructure::rejections::ErrorEntry;
use customer_ingest::infrastructure::repository::SinkError;
use customer_ingest::{
    BatchError, CustomerRecord, CustomerRepositoryTrait, IngestionService, RateLimiter,
    RawCustomerRecord, RecordValidator, RejectionLog,
};

mock! {
    pub CustomerRepo {}

    #[async_trait]
    impl CustomerRepositoryTrait for CustomerRepo {
        async fn insert(&self, record: &CustomerRecord) -> Result<(), SinkError>;
    }
}

struct Harness {
    service: IngestionService,
    rejections: Arc<RejectionLog>,
    _dir: TempDir,
}

fn harness(limit: usize, repo: MockCustomerRepo) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let rejections = Arc::new(RejectionLog::open(dir.path().join("error.log")).unwrap());

    let service = IngestionService::new(
        RecordValidator::new(rejections.clone()),
        RateLimiter::per_minute(limit),
        Arc::new(repo),
        rejections.clone(),
    );

    Harness {
        service,
        rejections,
        _dir: dir,
    }
}

fn logged_entries(rejections: &RejectionLog) -> Vec<ErrorEntry> {
    let contents = std::fs::read_to_string(rejections.path()).unwrap();
    contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn raw(customer_id: &str, email: &str, name: &str, created_at: &str) -> RawCustomerRecord {
    RawCustomerRecord {
        customer_id: customer_id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        created_at: created_at.to_string(),
    }
}

#[tokio::test]
async fn batch_with_one_invalid_email_reports_two_successes_one_failure() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().times(2).returning(|_| Ok(()));

    let h = harness(5, repo);
    let report = h
        .service
        .process_batch(vec![
            raw("cust1", "one@example.com", "User One", "2024-03-26T12:00:00Z"),
            raw("cust2", "two@example.com", "User Two", "2024-03-26T12:00:01Z"),
            raw("cust3", "not-an-email", "User Three", "2024-03-26T12:00:02Z"),
        ])
        .await;

    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.total(), 3);

    let entries = logged_entries(&h.rejections);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].customer_id, "cust3");
    assert_eq!(entries[0].reason, "invalid email format");
    assert_eq!(entries[0].status, "error");
}

#[tokio::test]
async fn same_customer_past_the_limit_is_rate_limited() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().times(5).returning(|_| Ok(()));

    let h = harness(5, repo);
    let records: Vec<RawCustomerRecord> = (0..10)
        .map(|i| {
            raw(
                "cust1",
                "user@example.com",
                "Heavy User",
                &format!("2024-03-26T12:00:{:02}Z", i * 5),
            )
        })
        .collect();

    let report = h.service.process_batch(records).await;

    assert_eq!(report.success_count, 5);
    assert_eq!(report.error_count, 5);

    let entries = logged_entries(&h.rejections);
    assert_eq!(entries.len(), 5);
    for entry in &entries {
        assert_eq!(entry.customer_id, "cust1");
        assert_eq!(entry.reason, "rate limit exceeded");
    }
}

#[tokio::test]
async fn admissions_resume_once_the_window_has_passed() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().times(6).returning(|_| Ok(()));

    let h = harness(5, repo);
    let mut records: Vec<RawCustomerRecord> = (0..5)
        .map(|i| {
            raw(
                "cust1",
                "user@example.com",
                "Heavy User",
                &format!("2024-03-26T12:00:{:02}Z", i),
            )
        })
        .collect();
    // 61 seconds after the first record: the original five have aged out.
    records.push(raw(
        "cust1",
        "user@example.com",
        "Heavy User",
        "2024-03-26T12:01:01Z",
    ));

    let report = h.service.process_batch(records).await;

    assert_eq!(report.success_count, 6);
    assert_eq!(report.error_count, 0);
}

#[tokio::test]
async fn malformed_container_fails_fatally_without_logging() {
    let repo = MockCustomerRepo::new();
    let h = harness(5, repo);

    let dir = tempfile::tempdir().unwrap();
    let batch_path = dir.path().join("records.json");
    std::fs::write(&batch_path, "{\"records\": [{\"customerId\": ").unwrap();

    let result = h.service.process_batch_file(&batch_path).await;

    assert!(matches!(result, Err(BatchError::Malformed(_))));
    assert_eq!(h.rejections.error_count(), 0);
    assert!(logged_entries(&h.rejections).is_empty());
}

#[tokio::test]
async fn missing_batch_file_fails_fatally() {
    let repo = MockCustomerRepo::new();
    let h = harness(5, repo);

    let result = h.service.process_batch_file("no-such-batch.json").await;

    assert!(matches!(result, Err(BatchError::Io(_))));
    assert_eq!(h.rejections.error_count(), 0);
}

#[tokio::test]
async fn well_formed_batch_file_is_processed() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().times(1).returning(|_| Ok(()));

    let h = harness(5, repo);

    let dir = tempfile::tempdir().unwrap();
    let batch_path = dir.path().join("records.json");
    std::fs::write(
        &batch_path,
        r#"{
            "records": [
                {
                    "customerId": "cust1",
                    "email": "one@example.com",
                    "name": "User One",
                    "createdAt": "2024-03-26T12:00:00Z"
                }
            ]
        }"#,
    )
    .unwrap();

    let report = h.service.process_batch_file(&batch_path).await.unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.error_count, 0);
}

#[tokio::test]
async fn unparsable_timestamp_is_logged_and_never_validated() {
    let repo = MockCustomerRepo::new();
    let h = harness(5, repo);

    let report = h
        .service
        .process_batch(vec![raw(
            "cust1",
            "user@example.com",
            "User One",
            "26-03-2024 12:00",
        )])
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 1);

    let entries = logged_entries(&h.rejections);
    assert_eq!(entries[0].reason, "invalid date format: 26-03-2024 12:00");
}

#[tokio::test]
async fn sink_failure_is_logged_with_the_underlying_reason() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert()
        .times(1)
        .returning(|_| Err(SinkError::Unavailable("connection refused".to_string())));

    let h = harness(5, repo);
    let report = h
        .service
        .process_batch(vec![raw(
            "cust1",
            "user@example.com",
            "User One",
            "2024-03-26T12:00:00Z",
        )])
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 1);

    let entries = logged_entries(&h.rejections);
    assert_eq!(entries[0].reason, "failed to insert: connection refused");
}

#[tokio::test]
async fn persisted_records_carry_a_defaulted_update_timestamp() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert()
        .times(1)
        .withf(|record| record.updated_at.is_some() && record.created_at.is_some())
        .returning(|_| Ok(()));

    let h = harness(5, repo);
    let report = h
        .service
        .process_batch(vec![raw(
            "cust1",
            "user@example.com",
            "User One",
            "2024-03-26T12:00:00Z",
        )])
        .await;

    assert_eq!(report.success_count, 1);
}

#[tokio::test]
async fn rejection_counter_is_cumulative_across_batches() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().returning(|_| Ok(()));

    let h = harness(5, repo);

    let first = h
        .service
        .process_batch(vec![
            raw("cust1", "one@example.com", "User One", "2024-03-26T12:00:00Z"),
            raw("", "two@example.com", "User Two", "2024-03-26T12:00:01Z"),
        ])
        .await;
    assert_eq!(first.success_count, 1);
    assert_eq!(first.error_count, 1);

    // The counter carries over: this batch's single failure reports as 2.
    let second = h
        .service
        .process_batch(vec![
            raw("cust2", "three@example.com", "User Three", "2024-03-26T12:00:02Z"),
            raw("cust3", "bad", "User Four", "2024-03-26T12:00:03Z"),
        ])
        .await;
    assert_eq!(second.success_count, 1);
    assert_eq!(second.error_count, 2);
}

#[tokio::test]
async fn every_attempted_record_is_either_persisted_or_logged() {
    let mut repo = MockCustomerRepo::new();
    repo.expect_insert().returning(|_| Ok(()));

    let h = harness(2, repo);
    let records = vec![
        raw("cust1", "one@example.com", "User One", "2024-03-26T12:00:00Z"),
        raw("cust1", "one@example.com", "User One", "2024-03-26T12:00:01Z"),
        raw("cust1", "one@example.com", "User One", "2024-03-26T12:00:02Z"),
        raw("cust2", "", "User Two", "2024-03-26T12:00:03Z"),
        raw("cust3", "three@example.com", "", "2024-03-26T12:00:04Z"),
        raw("cust4", "four@example.com", "User Four", "not-a-timestamp"),
    ];
    let attempted = records.len() as u64;

    let report = h.service.process_batch(records).await;

    assert_eq!(report.success_count + report.error_count, attempted);
    assert_eq!(
        h.rejections.error_count(),
        logged_entries(&h.rejections).len() as u64
    );
}
