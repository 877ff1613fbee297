//! PLACSP Atom feed document model and parser

pub mod models;
pub mod parser;

pub use models::{AtomEntry, AtomFeed, ContractFolderStatus};
pub use parser::{AtomParser, ParserError};
