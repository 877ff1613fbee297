//! PLACSP procurement feed ingestion
//!
//! Reads Atom feed dumps published by the Spanish public procurement
//! platform (PLACSP), flattens each entry into a contract record and loads
//! it into Postgres, with file- and record-level dedup so re-running over
//! the same dump directory is a no-op.

pub mod atom;
pub mod config;
pub mod contract_types;
pub mod convert;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod storage;

pub use config::IngestConfig;
pub use models::{Contract, FileStatus, ProcessedFile, Source};
pub use orchestrator::{IngestOrchestrator, RunReport};
pub use pipeline::{AtomPipeline, FileOutcome, FileReport};
pub use storage::{ContractStorage, StorageError};
