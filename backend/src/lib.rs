//! # Sheetmap - spreadsheet-to-spreadsheet migration
//!
//! Sheetmap moves data from one workbook layout to another. A configuration
//! workbook says which source sheet and column feeds which target sheet and
//! column, and how each value is carried over (`Copy` or `Translate`). The
//! same configuration can be applied right-to-left to migrate back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Config    │────▶│   Mapping   │────▶│  Executor   │────▶│   Output    │
//! │  workbook   │     │  (reverse?) │     │  (rules)    │     │  workbook   │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │   Source    │
//!                                         │ xlsx / csv  │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetmap::{transform_files, TransformOptions};
//! use std::path::Path;
//!
//! let result = transform_files(
//!     Path::new("config.xlsx"),
//!     Path::new("old.xlsx"),
//!     Path::new("new.xlsx"),
//!     &TransformOptions::default(),
//! )?;
//! println!("{}", result.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell values, key pairs, rules, configuration tables, datasets
//! - [`parser`] - CSV parsing with auto-detection
//! - [`workbook`] - Spreadsheet and CSV sources and sinks
//! - [`transform`] - Mapping table, reversal, rules, executor and pipeline
//! - [`validation`] - Mapping document schema validation
//! - [`api`] - HTTP API server and run logs

// Core modules
pub mod error;
pub mod models;

// Parsing and I/O
pub mod parser;
pub mod workbook;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, PipelineError, RuleError, ServerError, ValidationError, WorkbookError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellValue, ColumnPair, ConfigRow, ConfigTable, Dataset, Direction, ElementPair, Rule,
    RuleSpec, SheetData, SheetPair,
};

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use transform::mapping::{
    apply, build_mapping, execute, find_unmapped, reverse, rules_description, MappingDocument,
    MappingTable, TransformResult, UnmappedReport,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_mapping_document, validate_mapping_document};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_sheet, CsvError, ParseResult,
};

// =============================================================================
// Re-exports - Workbooks
// =============================================================================

pub use workbook::{
    open_sink, open_source, ConfigSource, CsvSink, CsvSource, DataSink, DataSource,
    ExcelSink, ExcelWorkbook,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    load_mapping, load_mapping_document, run, run_with_mapping, transform_files, RunOutput,
    RunReport, RunStats, TransformOptions,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, TransformResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
