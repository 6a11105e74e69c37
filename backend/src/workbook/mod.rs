//! Workbook collaborators: where configuration and data come from and where
//! the output goes.
//!
//! The mapping engine never touches files. It consumes three traits:
//!
//! - [`ConfigSource`] - configuration tables (`"<Source> - <Target>"` sheets)
//! - [`DataSource`] - the source dataset
//! - [`DataSink`] - persists the output dataset
//!
//! Implementations:
//!
//! | Type | Reads | Writes |
//! |------|-------|--------|
//! | [`ExcelWorkbook`] | `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods` | - |
//! | [`ExcelSink`] | - | `.xlsx` |
//! | [`CsvSource`] | one `.csv` file or a directory of them | - |
//! | [`CsvSink`] | - | one `.csv` file or a directory of them |
//! | `Vec<ConfigTable>` / [`Dataset`] | in memory | - |

mod delimited;
mod excel;

pub use delimited::{CsvSink, CsvSource};
pub use excel::{ExcelSink, ExcelWorkbook};

use std::path::Path;

use crate::error::{ConfigError, WorkbookError, WorkbookResult};
use crate::models::{
    CellValue, ConfigRow, ConfigTable, Dataset, SheetData, LEFT_TITLE, RIGHT_TITLE, TRANS_TYPE,
};

/// Spreadsheet extensions readable by [`ExcelWorkbook`].
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Provides the configuration tables of a mapping.
pub trait ConfigSource {
    fn config_tables(&mut self) -> WorkbookResult<Vec<ConfigTable>>;
}

/// Provides the source dataset.
pub trait DataSource {
    fn read_dataset(&mut self) -> WorkbookResult<Dataset>;
}

/// Persists an output dataset, one table per target sheet.
pub trait DataSink {
    fn write_dataset(&mut self, dataset: &Dataset) -> WorkbookResult<()>;
}

impl ConfigSource for Vec<ConfigTable> {
    fn config_tables(&mut self) -> WorkbookResult<Vec<ConfigTable>> {
        Ok(self.clone())
    }
}

impl DataSource for Dataset {
    fn read_dataset(&mut self) -> WorkbookResult<Dataset> {
        Ok(self.clone())
    }
}

/// Check if a path has a spreadsheet extension.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Open a data source by path: a spreadsheet, a CSV file or a directory of CSV files.
pub fn open_source(path: &Path) -> WorkbookResult<Box<dyn DataSource>> {
    if is_spreadsheet(path) {
        Ok(Box::new(ExcelWorkbook::open(path)?))
    } else if path.is_dir() || has_extension(path, "csv") {
        Ok(Box::new(CsvSource::new(path)))
    } else {
        Err(WorkbookError::Unsupported(format!(
            "cannot read data from '{}'",
            path.display()
        )))
    }
}

/// Open a data sink by path: `.xlsx`, a single `.csv` file, or a directory.
pub fn open_sink(path: &Path) -> WorkbookResult<Box<dyn DataSink>> {
    if has_extension(path, "xlsx") {
        Ok(Box::new(ExcelSink::new(path)))
    } else if has_extension(path, "csv") {
        Ok(Box::new(CsvSink::file(path)))
    } else if path.extension().is_none() || path.is_dir() {
        Ok(Box::new(CsvSink::directory(path)))
    } else {
        Err(WorkbookError::Unsupported(format!(
            "cannot write output to '{}': use .xlsx, .csv or a directory",
            path.display()
        )))
    }
}

// =============================================================================
// Row helpers shared by the readers
// =============================================================================

/// Turn the rows of a configuration sheet (header first) into a [`ConfigTable`].
///
/// `LeftTitle`, `RightTitle` and `TransType` are found by header name; every
/// cell to the right of the last of them is an element cell.
pub fn config_table_from_rows(
    label: &str,
    rows: &[Vec<CellValue>],
) -> Result<ConfigTable, ConfigError> {
    let mut table = ConfigTable::new(label);
    let Some((header, data)) = rows.split_first() else {
        return Ok(table);
    };

    let position = |name: &str| {
        header
            .iter()
            .position(|cell| cell.trimmed() == Some(name))
            .ok_or_else(|| ConfigError::MissingColumn {
                table: label.to_string(),
                column: name.to_string(),
            })
    };
    let left = position(LEFT_TITLE)?;
    let right = position(RIGHT_TITLE)?;
    let trans = position(TRANS_TYPE)?;
    let first_element = left.max(right).max(trans) + 1;

    for row in data {
        table.rows.push(ConfigRow {
            left_title: row.get(left).cloned().unwrap_or_default(),
            right_title: row.get(right).cloned().unwrap_or_default(),
            trans_type: row.get(trans).cloned().unwrap_or_default(),
            elements: row.iter().skip(first_element).cloned().collect(),
        });
    }

    Ok(table)
}

/// Turn the rows of a data sheet (header first) into columns.
///
/// Blank headers become `Unnamed: <index>`, repeated headers get a `.1`,
/// `.2`, ... suffix. Non-empty cells past the header width get an
/// `Unnamed: <index>` column too. Rows where every cell is empty are skipped;
/// short rows are padded with nulls.
pub fn sheet_from_rows(rows: &[Vec<CellValue>]) -> SheetData {
    let mut sheet = SheetData::new();
    let Some((header, data)) = rows.split_first() else {
        return sheet;
    };

    let width = data
        .iter()
        .filter_map(|row| row.iter().rposition(|cell| !cell.is_blank()))
        .map(|last| last + 1)
        .fold(header.len(), usize::max);

    let mut names: Vec<String> = Vec::with_capacity(width);
    for i in 0..width {
        let base = header
            .get(i)
            .and_then(CellValue::trimmed)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unnamed: {}", i));
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }

    for name in &names {
        sheet.insert(name.clone(), Vec::new());
    }

    for row in data.iter().filter(|row| !row.iter().all(CellValue::is_blank)) {
        for (i, values) in sheet.values_mut().enumerate() {
            values.push(row.get(i).cloned().unwrap_or_default());
        }
    }

    sheet
}
