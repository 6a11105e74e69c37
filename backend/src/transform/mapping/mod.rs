//! Mapping engine for spreadsheet-to-spreadsheet migration
//!
//! This module provides:
//! - `table`: Mapping table built from the configuration workbook
//! - `reverse`: Right-to-left version of a mapping table
//! - `rules`: Column rules (`Copy`, `Translate`)
//! - `executor`: Execute a mapping table on a source dataset
//!
//! ## Usage Flow
//!
//! ```text
//! Config workbook → table::build_mapping → (reverse) → executor::execute → Output dataset
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheetmap::transform::mapping::{build_mapping, execute};
//! use sheetmap::models::{ConfigRow, ConfigTable};
//!
//! // 1. Build the mapping from configuration tables
//! let config = vec![ConfigTable::new("Sheet1 - Sheet2")
//!     .with_row(ConfigRow::new("Name", "FullName", "Copy"))];
//! let mapping = build_mapping(&config)?;
//!
//! // 2. Optionally run it right-to-left
//! let mapping = mapping.reversed();
//!
//! // 3. Execute on source data
//! let result = execute(&source, &mapping)?;
//! for report in &result.unmapped {
//!     println!("{}", report);
//! }
//! ```

pub mod executor;
pub mod reverse;
pub mod rules;
pub mod table;

// Re-exports for convenience
pub use executor::{execute, find_unmapped, OverwrittenColumn, TransformResult, UnmappedReport};
pub use reverse::reverse;
pub use rules::{apply, apply_spec, rules_description};
pub use table::{
    build_mapping, parse_entry, parse_sheet_pair, ColumnMapping, ColumnMappingDocument,
    MappingDocument, MappingTable, ResolvedColumn, SheetMappingDocument,
};
