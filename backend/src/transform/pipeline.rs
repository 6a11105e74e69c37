//! High-level pipeline API for spreadsheet-to-spreadsheet migration.
//!
//! Combines all steps: load the mapping (configuration workbook or mapping
//! document), orient it, read the source data, transform, report.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetmap::transform::pipeline::{transform_files, TransformOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = transform_files(
//!         Path::new("config.xlsx"),
//!         Path::new("old.xlsx"),
//!         Path::new("new.xlsx"),
//!         &TransformOptions::default(),
//!     )?;
//!
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{ConfigTable, Dataset, Direction};
use crate::transform::mapping::{
    build_mapping, execute, MappingTable, OverwrittenColumn, TransformResult, UnmappedReport,
};
use crate::validation::validate_mapping_json;
use crate::workbook::{open_sink, open_source, ConfigSource, DataSink, DataSource, ExcelWorkbook};

/// Environment variable holding the default direction.
pub const DIRECTION_ENV: &str = "SHEETMAP_DIRECTION";

/// Options for the transformation pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Apply the configuration left-to-right or right-to-left
    pub direction: Direction,

    /// Use a saved mapping document instead of the configuration workbook
    pub mapping_path: Option<String>,

    /// Skip schema validation of the mapping document
    pub skip_validation: bool,
}

impl TransformOptions {
    /// Defaults, with the direction taken from `SHEETMAP_DIRECTION` when set.
    ///
    /// An unparseable value is logged and ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(value) = std::env::var(DIRECTION_ENV) {
            match value.parse() {
                Ok(direction) => options.direction = direction,
                Err(e) => log_warning(format!("{}: {}", DIRECTION_ENV, e)),
            }
        }
        options
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Counts describing a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub source_sheets: usize,
    pub source_columns: usize,
    pub mapped_columns: usize,
    pub output_sheets: usize,
    pub unmapped_sheets: usize,
    pub unmapped_columns: usize,
    pub overwritten_columns: usize,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Target sheets and columns
    pub output: Dataset,

    /// Source sheets and columns the mapping does not cover
    pub unmapped: Vec<UnmappedReport>,

    /// Target columns written more than once
    pub overwritten: Vec<OverwrittenColumn>,

    /// Direction the mapping was applied in
    pub direction: Direction,

    pub stats: RunStats,
}

impl RunOutput {
    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} of {} columns mapped into {} sheets ({} unmapped sheets, {} unmapped columns)",
            self.stats.mapped_columns,
            self.stats.source_columns,
            self.stats.output_sheets,
            self.stats.unmapped_sheets,
            self.stats.unmapped_columns
        )
    }

    /// Run report without the output data, stamped with the current time.
    pub fn report(&self) -> RunReport {
        RunReport {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            direction: self.direction,
            stats: self.stats.clone(),
            unmapped: self.unmapped.clone(),
            overwritten: self.overwritten.clone(),
        }
    }
}

/// Serializable run report (`run --report`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub generated_at: String,
    pub direction: Direction,
    pub stats: RunStats,
    pub unmapped: Vec<UnmappedReport>,
    pub overwritten: Vec<OverwrittenColumn>,
}

// =============================================================================
// Mapping loading
// =============================================================================

/// Build the mapping table from a configuration source.
pub fn load_mapping(config: &mut dyn ConfigSource) -> PipelineResult<MappingTable> {
    log_info("📖 Reading configuration...");
    let tables = config.config_tables()?;
    log_success(format!("Read {} configuration tables", tables.len()));

    let mapping = build_mapping(&tables)?;
    log_success(format!(
        "{} sheet pairs, {} column pairs",
        mapping.len(),
        mapping.column_count()
    ));
    Ok(mapping)
}

/// Load a saved mapping document, validating it against the schema first
/// unless `validate` is false.
pub fn load_mapping_document(path: &Path, validate: bool) -> PipelineResult<MappingTable> {
    log_info(format!("Using mapping document: {}", path.display()));
    let content = std::fs::read_to_string(path)?;

    if validate {
        validate_mapping_json(&content)?;
        log_success("Mapping document is valid");
    } else {
        log_info("(validation skipped)");
    }

    let mapping = MappingTable::from_json(&content)?;
    log_success(format!(
        "{} sheet pairs, {} column pairs",
        mapping.len(),
        mapping.column_count()
    ));
    Ok(mapping)
}

/// The mapping for a run: the document named in `options`, or the
/// configuration source, oriented in `options.direction`.
pub fn resolve_mapping(
    config: &mut dyn ConfigSource,
    options: &TransformOptions,
) -> PipelineResult<MappingTable> {
    let mapping = match &options.mapping_path {
        Some(path) => load_mapping_document(Path::new(path), !options.skip_validation)?,
        None => load_mapping(config)?,
    };

    if options.direction.is_reverse() {
        log_info("🔁 Reversing mapping (right-to-left)");
    }
    Ok(mapping.oriented(options.direction))
}

// =============================================================================
// Running
// =============================================================================

/// Run the whole pipeline on a configuration and a data source.
///
/// When `options.mapping_path` is set the configuration source is not read.
pub fn run(
    config: &mut dyn ConfigSource,
    data: &mut dyn DataSource,
    options: &TransformOptions,
) -> PipelineResult<RunOutput> {
    let mapping = resolve_mapping(config, options)?;

    log_info("📖 Reading source data...");
    let dataset = data.read_dataset()?;
    log_success(format!("Read {} sheets", dataset.len()));

    run_with_mapping(&mapping, &dataset, options.direction)
}

/// Transform a dataset with an already oriented mapping.
///
/// `direction` is recorded in the result; the mapping is used as given.
pub fn run_with_mapping(
    mapping: &MappingTable,
    dataset: &Dataset,
    direction: Direction,
) -> PipelineResult<RunOutput> {
    log_info("⚙️  Transforming...");
    for (sheet, columns) in dataset {
        log_info_indent(format!("{} ({} columns)", sheet, columns.len()), 1);
    }

    let result = execute(dataset, mapping)?;
    log_success(result.summary());

    let output = build_output(dataset, result, direction);
    print_diagnostics(&output);
    Ok(output)
}

fn build_output(dataset: &Dataset, result: TransformResult, direction: Direction) -> RunOutput {
    let unmapped_sheets = result
        .unmapped
        .iter()
        .filter(|u| matches!(u, UnmappedReport::Sheet { .. }))
        .count();

    let stats = RunStats {
        source_sheets: dataset.len(),
        source_columns: dataset.values().map(|sheet| sheet.len()).sum(),
        mapped_columns: result.mapped_columns,
        output_sheets: result.output.len(),
        unmapped_sheets,
        unmapped_columns: result.unmapped.len() - unmapped_sheets,
        overwritten_columns: result.overwritten.len(),
    };

    RunOutput {
        output: result.output,
        unmapped: result.unmapped,
        overwritten: result.overwritten,
        direction,
        stats,
    }
}

/// Log unmapped and overwritten items in aggregate.
fn print_diagnostics(output: &RunOutput) {
    if output.unmapped.is_empty() {
        log_success("Every source sheet and column is mapped");
    } else {
        log_warning(format!("{} unmapped items:", output.unmapped.len()));
        for report in &output.unmapped {
            log_warning_indent(report.to_string(), 1);
        }
    }

    if !output.overwritten.is_empty() {
        log_warning(format!(
            "{} target columns written more than once (last write kept):",
            output.overwritten.len()
        ));
        for column in &output.overwritten {
            log_warning_indent(
                format!(
                    "{} -> {} (kept {} -> {})",
                    column.target_sheet,
                    column.target_column,
                    column.source_sheet,
                    column.source_column
                ),
                1,
            );
        }
    }
}

/// Run the pipeline on paths and write the output.
///
/// - `config`: configuration spreadsheet (ignored when `options.mapping_path` is set)
/// - `source`: spreadsheet, CSV file or directory of CSV files
/// - `target`: `.xlsx`, `.csv` (single target sheet) or a directory
pub fn transform_files(
    config: &Path,
    source: &Path,
    target: &Path,
    options: &TransformOptions,
) -> PipelineResult<RunOutput> {
    let mut data = open_source(source)?;
    let mut sink = open_sink(target)?;

    let result = if options.mapping_path.is_some() {
        run(&mut Vec::<ConfigTable>::new(), data.as_mut(), options)?
    } else {
        let mut workbook = ExcelWorkbook::open(config)?;
        run(&mut workbook, data.as_mut(), options)?
    };

    log_info(format!("💾 Writing {}...", target.display()));
    sink.write_dataset(&result.output)?;
    log_success(format!("Saved {} sheets", result.output.len()));
    Ok(result)
}

/// Write a run report as pretty JSON.
pub fn write_report(output: &RunOutput, path: &Path) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(&output.report())?;
    std::fs::write(path, json).map_err(PipelineError::from)
}
