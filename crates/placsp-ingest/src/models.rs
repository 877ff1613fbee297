//! Canonical contract data models
//!
//! These are the persisted records produced by the ingestion pipeline,
//! as opposed to the transient Atom document model in [`crate::atom`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

/// Origin of a feed file, classified from its file name.
///
/// PLACSP publishes two dumps: contracting-profile feeds ("perfiles") and
/// aggregated platform feeds ("agregadas"). Anything else is unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Perfiles,
    Agregadas,
    Unknown,
}

impl Source {
    /// Classify a source file name (case-insensitive substring match).
    pub fn classify(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.contains("perfiles") {
            Source::Perfiles
        } else if lower.contains("agregadas") {
            Source::Agregadas
        } else {
            Source::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Perfiles => "perfiles",
            Source::Agregadas => "agregadas",
            Source::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One procurement notice in its flat, persisted shape.
///
/// Created by the normalizer from one Atom entry, written once with
/// insert-skip-conflict semantics keyed on `external_id`, never updated
/// in place by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    /// Surrogate primary key
    pub id: Uuid,
    /// Entry id from the feed; unique across the whole corpus
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Publication timestamp from the feed (timezone-naive after parsing)
    pub updated_at: Option<NaiveDateTime>,
    /// Wall-clock time of normalization
    pub imported_at: DateTime<Utc>,
    pub link: Option<String>,
    /// Name (not path) of the feed file this contract came from
    pub source_file: String,
    pub source: Source,
    pub folder_id: Option<String>,
    pub status: Option<String>,
    pub type_code: Option<String>,
    pub subtype_code: Option<String>,
    pub estimated_amount: Option<BigDecimal>,
    pub total_amount: Option<BigDecimal>,
    pub tax_exclusive_amount: Option<BigDecimal>,
    /// "EUR" whenever the entry carried a budget block, otherwise None
    pub currency: Option<String>,
    pub cpv_code: Option<String>,
    pub country_subentity: Option<String>,
    pub nuts_code: Option<String>,
    pub contracting_party_name: Option<String>,
    pub contracting_party_id: Option<String>,
}

/// Processing status of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Completed => "COMPLETED",
            FileStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingestion receipt for one source file.
///
/// At most one record exists per file name; its presence is what makes
/// the orchestrator skip the file on subsequent runs.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub contracts_processed: i32,
    pub duplicates_found: i32,
    pub processed_at: DateTime<Utc>,
    pub status: FileStatus,
    pub error_message: Option<String>,
}

impl ProcessedFile {
    /// Build a COMPLETED receipt for a file
    pub fn completed(
        file_name: String,
        file_path: String,
        contracts_processed: i32,
        duplicates_found: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            file_path,
            contracts_processed,
            duplicates_found,
            processed_at: Utc::now(),
            status: FileStatus::Completed,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_classification() {
        assert_eq!(
            Source::classify("licitacionesPerfilesContratanteCompleto3_20240101.atom"),
            Source::Perfiles
        );
        assert_eq!(
            Source::classify("PlataformasAgregadasSinMenores_202401.atom"),
            Source::Agregadas
        );
        assert_eq!(Source::classify("export_batch_3.atom"), Source::Unknown);
    }

    #[test]
    fn test_source_as_str() {
        assert_eq!(Source::Perfiles.as_str(), "perfiles");
        assert_eq!(Source::Agregadas.as_str(), "agregadas");
        assert_eq!(Source::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_file_status_display() {
        assert_eq!(FileStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(FileStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_completed_receipt() {
        let receipt =
            ProcessedFile::completed("a.atom".to_string(), "/data/a.atom".to_string(), 10, 2);
        assert_eq!(receipt.status, FileStatus::Completed);
        assert_eq!(receipt.contracts_processed, 10);
        assert_eq!(receipt.duplicates_found, 2);
        assert!(receipt.error_message.is_none());
    }
}
