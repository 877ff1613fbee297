//! Run-level orchestration: discover feed files, skip the ones already
//! ingested, process the rest one at a time
//!
//! One bad file never stops a run; cancellation is honored between files
//! so an in-flight file always finishes cleanly.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use placsp_common::PlacspError;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::pipeline::{AtomPipeline, FileOutcome};
use crate::storage::ContractStorage;

/// Aggregate outcome of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files_discovered: usize,
    pub files_skipped: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub contracts_stored: usize,
    pub duplicates_found: usize,
}

impl RunReport {
    /// Human-readable run summary
    pub fn summary(&self) -> String {
        format!(
            "Ingestion Summary:\n\
             - Files discovered: {}\n\
             - Skipped (already processed): {}\n\
             - Successful: {}\n\
             - Failed: {}\n\
             - Contracts stored: {}\n\
             - Duplicates skipped: {}",
            self.files_discovered,
            self.files_skipped,
            self.files_succeeded,
            self.files_failed,
            self.contracts_stored,
            self.duplicates_found
        )
    }
}

/// Orchestrator for a full ingestion run over a directory tree
pub struct IngestOrchestrator {
    config: IngestConfig,
    storage: ContractStorage,
    pipeline: AtomPipeline,
}

impl IngestOrchestrator {
    pub fn new(config: IngestConfig, db: PgPool) -> Self {
        Self {
            config,
            storage: ContractStorage::new(db.clone()),
            pipeline: AtomPipeline::new(db),
        }
    }

    /// Recursively discover feed files under the configured input directory.
    ///
    /// Filters on the configured extension (case-insensitive) and sorts the
    /// result so runs are deterministic. An unreadable root is fatal; the
    /// run cannot start without its input.
    pub fn discover_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let root = &self.config.input_dir;
        if !root.is_dir() {
            return Err(PlacspError::Discovery(format!(
                "input directory {} does not exist",
                root.display()
            ))
            .into());
        }

        let wanted = self.config.file_extension.to_lowercase();
        let mut files = Vec::new();
        for dir_entry in WalkDir::new(root) {
            let dir_entry = dir_entry.map_err(|e| {
                PlacspError::Discovery(format!("failed to scan {}: {e}", root.display()))
            })?;
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let matches = dir_entry
                .path()
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase() == wanted)
                .unwrap_or(false);
            if matches {
                files.push(dir_entry.into_path());
            }
        }
        files.sort();

        info!(
            count = files.len(),
            dir = %root.display(),
            "discovered feed files"
        );
        Ok(files)
    }

    /// Run a full ingestion pass.
    ///
    /// Already-processed files (by name) are skipped up front; the rest are
    /// processed sequentially with per-file failure isolation.
    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<RunReport> {
        let files = self.discover_files()?;
        let processed: HashSet<String> = self
            .storage
            .list_processed_file_names()
            .await
            .context("failed to load processed file registry")?;

        let mut report = RunReport {
            files_discovered: files.len(),
            ..Default::default()
        };

        for path in files {
            if cancel.is_cancelled() {
                warn!("cancellation requested, stopping before next file");
                break;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            if processed.contains(&file_name) {
                info!(file = %file_name, "already processed, skipping");
                report.files_skipped += 1;
                continue;
            }

            let file_report = self.pipeline.process_file(&path).await;
            match file_report.outcome {
                FileOutcome::Completed => {
                    report.files_succeeded += 1;
                    report.contracts_stored += file_report.contracts_stored;
                    report.duplicates_found += file_report.duplicates_found;
                }
                FileOutcome::Failed => {
                    report.files_failed += 1;
                }
            }
        }

        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn orchestrator_for(dir: &std::path::Path) -> IngestOrchestrator {
        let mut config = IngestConfig::default();
        config.input_dir = dir.to_path_buf();
        let pool = sqlx::PgPool::connect_lazy(&config.database.url)
            .expect("lazy pool");
        IngestOrchestrator::new(config, pool)
    }

    #[tokio::test]
    async fn test_discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.atom"), "<feed/>").unwrap();
        fs::write(dir.path().join("nested/a.ATOM"), "<feed/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join("noext"), "ignore me").unwrap();

        let orchestrator = orchestrator_for(dir.path());
        let files = orchestrator.discover_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        // lexicographic path order: b.atom at the root, a.ATOM nested deeper
        assert!(names.contains(&"a.ATOM".to_string()));
        assert!(names.contains(&"b.atom".to_string()));
    }

    #[tokio::test]
    async fn test_discovery_missing_root_is_fatal() {
        let orchestrator = orchestrator_for(std::path::Path::new("/nonexistent/feeds"));
        let err = orchestrator.discover_files().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlacspError>(),
            Some(PlacspError::Discovery(_))
        ));
    }

    #[test]
    fn test_empty_run_report_summary() {
        let report = RunReport::default();
        let summary = report.summary();
        assert!(summary.contains("Files discovered: 0"));
        assert!(summary.contains("Failed: 0"));
    }
}
