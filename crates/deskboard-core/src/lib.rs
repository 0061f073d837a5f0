//! # Deskboard Core
//!
//! Core library for Deskboard, a personal business dashboard kept in a single
//! encrypted file.
//!
//! This crate provides the record types, the derived views over them, and
//! the storage engine, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **storage**: Storage engine trait and the age + SQLite implementation
//! - **record**: The `Record` trait every persisted type implements
//! - **matter** / **sla**: Case tracking and SLA status derivation
//! - **networth**: Dated balances and "latest wins" aggregation
//! - **leave**, **meeting**, **note**: Personal schedule and notes
//! - **project** / **workflow**: Project and workflow boards
//! - **gtci**: Global Talent Competitiveness Index report
//! - **dashboard**: The cross-view overview

pub mod crypto;
pub mod dashboard;
pub mod error;
pub mod fs;
pub mod gtci;
pub mod leave;
pub mod matter;
pub mod meeting;
pub mod money;
pub mod networth;
pub mod note;
pub mod project;
pub mod record;
pub mod sla;
pub mod storage;
pub mod validation;
pub mod workflow;

pub use error::{DeskError, Result};
pub use record::{Record, RecordKind};
pub use storage::StorageEngine;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
