//! Postgres persistence for contracts and processed-file receipts
//!
//! Record-level dedup lives here: contract inserts carry
//! `ON CONFLICT (external_id) DO NOTHING`, so re-storing an already-seen
//! notice is a silent skip and the returned count reflects only rows that
//! actually landed.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::models::{Contract, ProcessedFile};

/// Contracts inserted per transaction
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage handler for the ingestion tables
pub struct ContractStorage {
    db: PgPool,
    batch_size: usize,
}

impl ContractStorage {
    /// Create a storage handler with the default batch size
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Create a storage handler with a custom batch size
    pub fn with_batch_size(db: PgPool, batch_size: usize) -> Self {
        Self { db, batch_size }
    }

    /// Apply pending schema migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    /// Names of every file already recorded as processed
    pub async fn list_processed_file_names(&self) -> Result<HashSet<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT file_name FROM processed_files")
                .fetch_all(&self.db)
                .await?;
        Ok(names.into_iter().collect())
    }

    /// Insert a batch of contracts, skipping external ids already stored.
    ///
    /// Returns the number of rows actually inserted; the difference to the
    /// batch length is the duplicate count.
    pub async fn store_contracts(&self, contracts: &[Contract]) -> Result<usize> {
        if contracts.is_empty() {
            return Ok(0);
        }

        let total_chunks = contracts.len().div_ceil(self.batch_size);
        let mut inserted = 0;

        for (chunk_idx, chunk) in contracts.chunks(self.batch_size).enumerate() {
            debug!(
                "storing contracts chunk {} / {} ({} contracts)",
                chunk_idx + 1,
                total_chunks,
                chunk.len()
            );

            let mut tx = self.db.begin().await?;
            inserted += self.batch_insert_contracts(&mut tx, chunk).await?;
            tx.commit().await?;
        }

        info!(
            inserted,
            duplicates = contracts.len() - inserted,
            "contract batch stored"
        );
        Ok(inserted)
    }

    async fn batch_insert_contracts(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        contracts: &[Contract],
    ) -> Result<usize> {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO contracts (
                id,
                external_id,
                title,
                summary,
                updated_at,
                imported_at,
                link,
                source_file,
                source,
                folder_id,
                status,
                type_code,
                subtype_code,
                estimated_amount,
                total_amount,
                tax_exclusive_amount,
                currency,
                cpv_code,
                country_subentity,
                nuts_code,
                contracting_party_name,
                contracting_party_id
            )
            "#,
        );

        query_builder.push_values(contracts, |mut b, contract| {
            b.push_bind(contract.id)
                .push_bind(&contract.external_id)
                .push_bind(&contract.title)
                .push_bind(&contract.summary)
                .push_bind(contract.updated_at)
                .push_bind(contract.imported_at.naive_utc())
                .push_bind(&contract.link)
                .push_bind(&contract.source_file)
                .push_bind(contract.source.as_str())
                .push_bind(&contract.folder_id)
                .push_bind(&contract.status)
                .push_bind(&contract.type_code)
                .push_bind(&contract.subtype_code)
                .push_bind(&contract.estimated_amount)
                .push_bind(&contract.total_amount)
                .push_bind(&contract.tax_exclusive_amount)
                .push_bind(&contract.currency)
                .push_bind(&contract.cpv_code)
                .push_bind(&contract.country_subentity)
                .push_bind(&contract.nuts_code)
                .push_bind(&contract.contracting_party_name)
                .push_bind(&contract.contracting_party_id);
        });

        query_builder.push(" ON CONFLICT (external_id) DO NOTHING");

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected() as usize)
    }

    /// Record the receipt for a processed file.
    ///
    /// The file name is unique; a concurrent duplicate receipt is a no-op
    /// rather than an error.
    pub async fn record_processed_file(&self, receipt: &ProcessedFile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_files (
                id,
                file_name,
                file_path,
                contracts_processed,
                duplicates_found,
                processed_at,
                status,
                error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (file_name) DO NOTHING
            "#,
        )
        .bind(receipt.id)
        .bind(&receipt.file_name)
        .bind(&receipt.file_path)
        .bind(receipt.contracts_processed)
        .bind(receipt.duplicates_found)
        .bind(receipt.processed_at.naive_utc())
        .bind(receipt.status.as_str())
        .bind(&receipt.error_message)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Total contracts stored
    pub async fn contract_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contracts")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Total files recorded as processed
    pub async fn processed_file_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_files")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
