//! Error types for the sheetmap migration pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ConfigError`] - Malformed mapping configuration (fatal)
//! - [`RuleError`] - A column references a rule the engine does not know (fatal)
//! - [`WorkbookError`] - Reading or writing spreadsheets and CSV files
//! - [`ValidationError`] - Mapping documents rejected by the JSON schema
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Unmapped sheets and columns are *not* errors: they are collected as
//! [`crate::transform::UnmappedReport`] values and reported at the end of a run.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::parser::CsvError;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while turning the configuration workbook into a mapping table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration sheet name is not of the form `Source - Target`.
    #[error("Invalid sheet pair label '{label}': expected exactly one '-' between non-empty source and target sheet names")]
    InvalidSheetPair { label: String },

    /// A trailing element cell is not of the form `source-target`.
    #[error("Invalid element pair '{cell}' in '{table}' row {row}: expected exactly one '-'")]
    InvalidElementPair {
        table: String,
        row: usize,
        cell: String,
    },

    /// A required field is empty on a configuration row.
    #[error("Missing value for '{field}' in '{table}' row {row}")]
    MissingField {
        table: String,
        row: usize,
        field: String,
    },

    /// The configuration sheet has no header with this name.
    #[error("Configuration sheet '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },
}

// =============================================================================
// Rule Errors
// =============================================================================

/// Errors while applying a rule to a column.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The rule name is not one of the known rules.
    #[error("Unknown mapping rule: '{0}'")]
    UnknownRule(String),
}

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors from the spreadsheet and CSV collaborators.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Filesystem error.
    #[error("Workbook IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be opened as a spreadsheet.
    #[error("Failed to open workbook '{path}': {message}")]
    Open { path: String, message: String },

    /// A worksheet could not be read.
    #[error("Failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    /// The output workbook could not be written.
    #[error("Failed to write workbook: {0}")]
    Write(String),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A configuration sheet is malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The path has no known reader or writer.
    #[error("Unsupported file: {0}")]
    Unsupported(String),
}

impl From<rust_xlsxwriter::XlsxError> for WorkbookError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        WorkbookError::Write(err.to_string())
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors while validating a mapping document.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Mapping document failed validation: {errors:?}")]
    SchemaError { errors: Vec<String> },

    /// Document is not valid JSON.
    #[error("Mapping document is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`].
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration parsing error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule application error.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Spreadsheet or CSV error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Mapping document validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error outside of the workbook layer (reports, mapping files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CsvError> for PipelineError {
    fn from(err: CsvError) -> Self {
        PipelineError::Workbook(WorkbookError::Csv(err))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for rule application.
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type for workbook operations.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ConfigError -> PipelineError
        let config_err = ConfigError::InvalidSheetPair {
            label: "Sheet1".into(),
        };
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("Sheet1"));

        // RuleError -> PipelineError
        let rule_err = RuleError::UnknownRule("Uppercase".into());
        let pipeline_err: PipelineError = rule_err.into();
        assert!(pipeline_err.to_string().contains("Uppercase"));

        // CsvError -> PipelineError
        let csv_err = CsvError::new(1, "Empty CSV file");
        let pipeline_err: PipelineError = csv_err.into();
        assert!(matches!(pipeline_err, PipelineError::Workbook(WorkbookError::Csv(_))));
    }

    #[test]
    fn test_element_pair_error_format() {
        let err = ConfigError::InvalidElementPair {
            table: "People - Staff".into(),
            row: 3,
            cell: "M-Male-X".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("M-Male-X"));
        assert!(msg.contains("People - Staff"));
        assert!(msg.contains("row 3"));
    }
}
