//! Transformation module.
//!
//! This module handles spreadsheet-to-spreadsheet migration:
//! - Mapping: Mapping table, reversal, rules and executor
//! - Pipeline: Main transformation pipeline

pub mod mapping;
pub mod pipeline;

pub use mapping::*;
pub use pipeline::*;
