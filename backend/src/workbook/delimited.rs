//! CSV collaborators. A single file is one sheet named after its stem; a
//! directory is a dataset with one sheet per `.csv` file.

use std::fs;
use std::path::{Path, PathBuf};

use super::{has_extension, DataSink, DataSource};
use crate::error::{WorkbookError, WorkbookResult};
use crate::models::Dataset;
use crate::parser::{parse_csv_file_auto, sheet_to_csv};

/// Output delimiter. Input delimiters are detected per file.
const OUTPUT_DELIMITER: char = ',';

/// Reads one CSV file, or every `.csv` file of a directory in name order.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn files(&self) -> WorkbookResult<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, "csv") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DataSource for CsvSource {
    fn read_dataset(&mut self) -> WorkbookResult<Dataset> {
        let mut dataset = Dataset::new();
        for file in self.files()? {
            let parsed = parse_csv_file_auto(&file)?;
            dataset.insert(sheet_name(&file), parsed.sheet);
        }
        Ok(dataset)
    }
}

fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

enum Target {
    File(PathBuf),
    Directory(PathBuf),
}

/// Writes CSV output: a single file for a one-sheet dataset, or one
/// `<sheet>.csv` per target sheet inside a directory.
pub struct CsvSink {
    target: Target,
}

impl CsvSink {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Directory(path.into()),
        }
    }
}

impl DataSink for CsvSink {
    fn write_dataset(&mut self, dataset: &Dataset) -> WorkbookResult<()> {
        match &self.target {
            Target::File(path) => {
                if dataset.len() > 1 {
                    return Err(WorkbookError::Unsupported(format!(
                        "{} target sheets cannot be written to the single file '{}'; use a directory or .xlsx",
                        dataset.len(),
                        path.display()
                    )));
                }
                if let Some(sheet) = dataset.values().next() {
                    fs::write(path, sheet_to_csv(sheet, OUTPUT_DELIMITER)?)?;
                }
            }
            Target::Directory(dir) => {
                fs::create_dir_all(dir)?;
                for (name, sheet) in dataset {
                    let file = dir.join(format!("{}.csv", name));
                    fs::write(file, sheet_to_csv(sheet, OUTPUT_DELIMITER)?)?;
                }
            }
        }
        Ok(())
    }
}
