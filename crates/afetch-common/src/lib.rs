//! afetch Common Library
//!
//! Shared types, utilities, and error handling for the afetch workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`AfError`] and the [`Result`] alias
//! - **Checksums**: SHA-256 helpers for fetched structure files
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Types**: [`StructureFormat`](types::StructureFormat) and object naming rules
//!
//! # Example
//!
//! ```no_run
//! use afetch_common::types::StructureFormat;
//! use afetch_common::Result;
//!
//! fn remote_name(code: &str, version: u32, kind: &str) -> Result<String> {
//!     let format = StructureFormat::parse(kind)?;
//!     Ok(format!("AF-{}-F1-model_v{}.{}", code, version, format.remote_extension()))
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{AfError, Result};
pub use types::StructureFormat;
