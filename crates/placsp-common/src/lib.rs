//! PLACSP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the PLACSP ingestion workspace.
//!
//! # Overview
//!
//! This crate provides the functionality shared by all workspace members:
//!
//! - **Error Handling**: the [`PlacspError`] type and [`Result`] alias
//! - **Logging**: centralized `tracing` configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use placsp_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{PlacspError, Result};
