use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::domain::CustomerRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("record missing creation timestamp")]
    MissingCreatedAt,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Persistence sink for accepted records. The pipeline only ever inserts;
/// reads are an operator concern outside this crate.
#[async_trait]
pub trait CustomerRepositoryTrait: Send + Sync + 'static {
    async fn insert(&self, record: &CustomerRecord) -> Result<(), SinkError>;
}

#[derive(Clone)]
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the customers table when it does not exist yet.
    pub async fn init(&self) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id BIGSERIAL PRIMARY KEY,
                customer_id TEXT NOT NULL,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                ingested_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("customers table ready");
        Ok(())
    }
}

#[async_trait]
impl CustomerRepositoryTrait for PostgresCustomerRepository {
    async fn insert(&self, record: &CustomerRecord) -> Result<(), SinkError> {
        let created_at = record.created_at.ok_or(SinkError::MissingCreatedAt)?;

        sqlx::query(
            "INSERT INTO customers (customer_id, email, name, created_at, ingested_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.customer_id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
