//! Spreadsheet reader (calamine) and writer (rust_xlsxwriter).

use calamine::{open_workbook_auto, Data, Reader, Sheets, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use super::{config_table_from_rows, sheet_from_rows, ConfigSource, DataSink, DataSource};
use crate::error::{WorkbookError, WorkbookResult};
use crate::models::{CellValue, ConfigTable, Dataset};

/// A spreadsheet opened for reading.
///
/// Every worksheet is either a configuration table (when used as a
/// [`ConfigSource`]) or a data sheet (when used as a [`DataSource`]).
pub struct ExcelWorkbook<RS: Read + Seek> {
    name: String,
    sheets: Sheets<RS>,
}

impl ExcelWorkbook<BufReader<File>> {
    /// Open a spreadsheet file; the format is picked from the extension.
    pub fn open(path: impl AsRef<Path>) -> WorkbookResult<Self> {
        let path = path.as_ref();
        let sheets = open_workbook_auto(path).map_err(|e| WorkbookError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name: path.display().to_string(),
            sheets,
        })
    }
}

impl ExcelWorkbook<Cursor<Vec<u8>>> {
    /// Read an `.xlsx` workbook from memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> WorkbookResult<Self> {
        let name = name.into();
        let xlsx = Xlsx::new(Cursor::new(bytes)).map_err(|e| WorkbookError::Open {
            path: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            sheets: Sheets::Xlsx(xlsx),
        })
    }
}

impl<RS: Read + Seek> ExcelWorkbook<RS> {
    /// Worksheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// All rows of a worksheet, header included.
    pub fn read_rows(&mut self, sheet: &str) -> WorkbookResult<Vec<Vec<CellValue>>> {
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| WorkbookError::Sheet {
                sheet: format!("{}:{}", self.name, sheet),
                message: e.to_string(),
            })?;

        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_value).collect())
            .collect())
    }
}

impl<RS: Read + Seek> ConfigSource for ExcelWorkbook<RS> {
    fn config_tables(&mut self) -> WorkbookResult<Vec<ConfigTable>> {
        let mut tables = Vec::new();
        for sheet in self.sheet_names() {
            let rows = self.read_rows(&sheet)?;
            tables.push(config_table_from_rows(&sheet, &rows)?);
        }
        Ok(tables)
    }
}

impl<RS: Read + Seek> DataSource for ExcelWorkbook<RS> {
    fn read_dataset(&mut self) -> WorkbookResult<Dataset> {
        let mut dataset = Dataset::new();
        for sheet in self.sheet_names() {
            let rows = self.read_rows(&sheet)?;
            dataset.insert(sheet, sheet_from_rows(&rows));
        }
        Ok(dataset)
    }
}

/// Convert a spreadsheet cell. Empty cells and error cells (`#N/A`, ...) are null.
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Int(i) => CellValue::text(i.to_string()),
        // Whole numbers are stored as floats; "42" is what the operator typed.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            CellValue::text((*f as i64).to_string())
        }
        Data::Float(f) => CellValue::text(f.to_string()),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        other => CellValue::text(other.to_string()),
    }
}

/// Writes the output dataset as one worksheet per target sheet.
pub struct ExcelSink {
    path: PathBuf,
}

impl ExcelSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Render a dataset as `.xlsx` bytes: bold header row, then values.
    /// Null cells are left blank.
    pub fn to_buffer(dataset: &Dataset) -> WorkbookResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for (sheet_name, columns) in dataset {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet_name).map_err(|e| {
                WorkbookError::Write(format!("invalid sheet name '{}': {}", sheet_name, e))
            })?;

            for (col, (column_name, values)) in columns.iter().enumerate() {
                let col = u16::try_from(col).map_err(|_| {
                    WorkbookError::Write(format!("too many columns in sheet '{}'", sheet_name))
                })?;
                worksheet.write_string_with_format(0, col, column_name, &header_format)?;

                for (row, value) in values.iter().enumerate() {
                    if let CellValue::Text(text) = value {
                        let row = u32::try_from(row + 1).map_err(|_| {
                            WorkbookError::Write(format!("too many rows in sheet '{}'", sheet_name))
                        })?;
                        worksheet.write_string(row, col, text)?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

impl DataSink for ExcelSink {
    fn write_dataset(&mut self, dataset: &Dataset) -> WorkbookResult<()> {
        let bytes = Self::to_buffer(dataset)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetData;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_config(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("People - Staff").unwrap();
        for (col, header) in ["LeftTitle", "RightTitle", "TransType"].iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Name").unwrap();
        sheet.write_string(1, 1, "FullName").unwrap();
        sheet.write_string(1, 2, "Copy").unwrap();
        sheet.write_string(2, 0, "Gender").unwrap();
        sheet.write_string(2, 1, "Sex").unwrap();
        sheet.write_string(2, 2, "Translate").unwrap();
        sheet.write_string(2, 3, "M-Male").unwrap();
        sheet.write_string(2, 5, "F-Female").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_read_config_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.xlsx");
        write_config(&path);

        let mut workbook = ExcelWorkbook::open(&path).unwrap();
        let tables = workbook.config_tables().unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].label, "People - Staff");
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[1].trans_type, CellValue::text("Translate"));
        assert_eq!(
            tables[0].rows[1].elements,
            vec![CellValue::text("M-Male"), CellValue::Null, CellValue::text("F-Female")]
        );
    }

    #[test]
    fn test_dataset_roundtrip() {
        let mut sheet = SheetData::new();
        sheet.insert(
            "FullName".into(),
            vec![CellValue::text("Alice"), CellValue::text("Bob")],
        );
        sheet.insert("Sex".into(), vec![CellValue::Null, CellValue::text("Male")]);
        let mut dataset = Dataset::new();
        dataset.insert("Staff".into(), sheet);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        ExcelSink::new(&path).write_dataset(&dataset).unwrap();

        let read = ExcelWorkbook::open(&path).unwrap().read_dataset().unwrap();
        assert_eq!(read, dataset);
    }

    #[test]
    fn test_from_bytes() {
        let mut sheet = SheetData::new();
        sheet.insert("Id".into(), vec![CellValue::text("7")]);
        let mut dataset = Dataset::new();
        dataset.insert("Orders".into(), sheet);

        let bytes = ExcelSink::to_buffer(&dataset).unwrap();
        let mut workbook = ExcelWorkbook::from_bytes("upload.xlsx", bytes).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Orders".to_string()]);
        assert_eq!(workbook.read_dataset().unwrap(), dataset);
    }

    #[test]
    fn test_invalid_sheet_name() {
        let mut dataset = Dataset::new();
        dataset.insert("a/b".into(), SheetData::new());
        assert!(matches!(
            ExcelSink::to_buffer(&dataset),
            Err(WorkbookError::Write(_))
        ));
    }

    #[test]
    fn test_numeric_cells() {
        assert_eq!(cell_value(&Data::Float(42.0)), CellValue::text("42"));
        assert_eq!(cell_value(&Data::Float(1.5)), CellValue::text("1.5"));
        assert_eq!(cell_value(&Data::Int(7)), CellValue::text("7"));
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Null);
    }

    #[test]
    fn test_open_missing_file() {
        let err = ExcelWorkbook::open("does-not-exist.xlsx").err().unwrap();
        assert!(matches!(err, WorkbookError::Open { .. }));
    }
}
