//! Per-file ingestion pipeline: read, parse, normalize, store, record
//!
//! A file is only marked processed once its contracts are safely stored;
//! any failure before that leaves no receipt, so the file is retried on
//! the next run.

use std::path::Path;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

use crate::atom::AtomParser;
use crate::convert::entry_to_contract;
use crate::models::ProcessedFile;
use crate::storage::ContractStorage;

/// Terminal state of one file's processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Completed,
    Failed,
}

/// What happened to one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
    pub contracts_stored: usize,
    pub duplicates_found: usize,
    pub error: Option<String>,
}

impl FileReport {
    fn failed(file_name: String, error: String) -> Self {
        Self {
            file_name,
            outcome: FileOutcome::Failed,
            contracts_stored: 0,
            duplicates_found: 0,
            error: Some(error),
        }
    }
}

/// Pipeline for a single feed file
pub struct AtomPipeline {
    storage: ContractStorage,
}

impl AtomPipeline {
    pub fn new(db: PgPool) -> Self {
        Self {
            storage: ContractStorage::new(db),
        }
    }

    pub fn with_storage(storage: ContractStorage) -> Self {
        Self { storage }
    }

    /// Process one feed file end to end.
    ///
    /// Never propagates an error: failures are captured in the report so
    /// the caller can keep going with the rest of the run.
    pub async fn process_file(&self, path: &Path) -> FileReport {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        info!(file = %file_name, "processing feed file");

        let feed = match AtomParser::parse_file(path) {
            Ok(feed) => feed,
            Err(e) => {
                error!(file = %file_name, error = %e, "failed to parse feed file");
                return FileReport::failed(file_name, e.to_string());
            }
        };

        let imported_at = Utc::now();
        let contracts: Vec<_> = feed
            .entries
            .iter()
            .map(|entry| entry_to_contract(entry, &file_name, imported_at))
            .collect();

        let inserted = match self.storage.store_contracts(&contracts).await {
            Ok(inserted) => inserted,
            Err(e) => {
                error!(file = %file_name, error = %e, "failed to store contracts");
                return FileReport::failed(file_name, e.to_string());
            }
        };
        let duplicates = contracts.len() - inserted;

        let receipt = ProcessedFile::completed(
            file_name.clone(),
            path.to_string_lossy().into_owned(),
            inserted as i32,
            duplicates as i32,
        );
        if let Err(e) = self.storage.record_processed_file(&receipt).await {
            error!(file = %file_name, error = %e, "failed to record processed file");
            return FileReport::failed(file_name, e.to_string());
        }

        info!(
            file = %file_name,
            entries = contracts.len(),
            stored = inserted,
            duplicates,
            "feed file processed"
        );

        FileReport {
            file_name,
            outcome: FileOutcome::Completed,
            contracts_stored: inserted,
            duplicates_found: duplicates,
            error: None,
        }
    }
}
