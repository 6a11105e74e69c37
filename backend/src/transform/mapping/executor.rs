//! Mapping executor
//!
//! Walks a source dataset sheet by sheet and column by column, resolves each
//! column through the mapping table and writes the transformed column into
//! the output dataset.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::RuleResult;
use crate::models::{Dataset, SheetData};

use super::rules::apply_spec;
use super::table::MappingTable;

/// Something in the source data that the mapping does not cover.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UnmappedReport {
    /// No sheet pair has this sheet as its source. All its columns are skipped.
    Sheet { sheet: String },
    /// The sheet is mapped but no column pair has this column as its source.
    Column { sheet: String, column: String },
}

impl fmt::Display for UnmappedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmappedReport::Sheet { sheet } => write!(f, "Unmapped sheet: {}", sheet),
            UnmappedReport::Column { sheet, column } => {
                write!(f, "Unmapped column: {} -> {}", sheet, column)
            }
        }
    }
}

/// A target column written more than once in a single run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverwrittenColumn {
    pub target_sheet: String,
    pub target_column: String,
    /// Source sheet and column whose values were kept.
    pub source_sheet: String,
    pub source_column: String,
}

/// Result of executing a mapping
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformResult {
    /// Target sheets and columns
    pub output: Dataset,
    /// Source sheets and columns the mapping does not cover
    pub unmapped: Vec<UnmappedReport>,
    /// Target columns that received values from more than one source column
    pub overwritten: Vec<OverwrittenColumn>,
    /// Number of columns that were transformed
    pub mapped_columns: usize,
}

impl TransformResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every source sheet and column was mapped
    pub fn is_complete(&self) -> bool {
        self.unmapped.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Transformed: {} columns into {} sheets, {} unmapped, {} overwritten",
            self.mapped_columns,
            self.output.len(),
            self.unmapped.len(),
            self.overwritten.len()
        )
    }
}

/// Execute a mapping table on a source dataset.
///
/// Unmapped sheets and columns are reported, never raised. The only error is
/// a column whose rule is unknown, which aborts the whole transformation.
///
/// When two source columns resolve to the same target column, the one
/// processed later wins and the collision is recorded in
/// [`TransformResult::overwritten`].
pub fn execute(source: &Dataset, mapping: &MappingTable) -> RuleResult<TransformResult> {
    let mut result = TransformResult::new();
    let mut written: HashSet<(String, String)> = HashSet::new();

    for (sheet_name, columns) in source {
        let Some((sheets, column_mapping)) = mapping.lookup_sheet(sheet_name) else {
            result.unmapped.push(UnmappedReport::Sheet {
                sheet: sheet_name.clone(),
            });
            continue;
        };

        let target_sheet = &sheets.target;
        result.output.entry(target_sheet.clone()).or_default();

        for (column_name, values) in columns {
            let Some((pair, spec)) = column_mapping.lookup(column_name) else {
                result.unmapped.push(UnmappedReport::Column {
                    sheet: sheet_name.clone(),
                    column: column_name.clone(),
                });
                continue;
            };

            let mapped = apply_spec(values, spec)?;

            if !written.insert((target_sheet.clone(), pair.target.clone())) {
                result.overwritten.push(OverwrittenColumn {
                    target_sheet: target_sheet.clone(),
                    target_column: pair.target.clone(),
                    source_sheet: sheet_name.clone(),
                    source_column: column_name.clone(),
                });
            }

            let target: &mut SheetData = result.output.entry(target_sheet.clone()).or_default();
            target.insert(pair.target.clone(), mapped);
            result.mapped_columns += 1;
        }
    }

    Ok(result)
}

/// List the sheets and columns of a dataset that a mapping does not cover,
/// without transforming anything.
pub fn find_unmapped(source: &Dataset, mapping: &MappingTable) -> Vec<UnmappedReport> {
    let mut unmapped = Vec::new();

    for (sheet_name, columns) in source {
        let Some((_, column_mapping)) = mapping.lookup_sheet(sheet_name) else {
            unmapped.push(UnmappedReport::Sheet {
                sheet: sheet_name.clone(),
            });
            continue;
        };

        unmapped.extend(
            columns
                .keys()
                .filter(|column| column_mapping.lookup(column).is_none())
                .map(|column| UnmappedReport::Column {
                    sheet: sheet_name.clone(),
                    column: column.clone(),
                }),
        );
    }

    unmapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::models::{CellValue, ConfigRow, ConfigTable, SheetData};
    use crate::transform::mapping::table::build_mapping;
    use pretty_assertions::assert_eq;

    fn column(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::text(*v)).collect()
    }

    fn dataset(sheets: Vec<(&str, Vec<(&str, Vec<CellValue>)>)>) -> Dataset {
        sheets
            .into_iter()
            .map(|(name, columns)| {
                let data: SheetData = columns
                    .into_iter()
                    .map(|(column, values)| (column.to_string(), values))
                    .collect();
                (name.to_string(), data)
            })
            .collect()
    }

    fn name_mapping() -> MappingTable {
        build_mapping(&[ConfigTable::new("Sheet1 - Sheet2")
            .with_row(ConfigRow::new("Name", "FullName", "Copy"))])
        .unwrap()
    }

    #[test]
    fn test_execute_copy() {
        let source = dataset(vec![("Sheet1", vec![("Name", column(&["Alice", "Bob"]))])]);
        let result = execute(&source, &name_mapping()).unwrap();

        assert!(result.is_complete());
        assert_eq!(result.mapped_columns, 1);
        assert_eq!(result.output["Sheet2"]["FullName"], column(&["Alice", "Bob"]));
    }

    #[test]
    fn test_unmapped_sheet() {
        let source = dataset(vec![
            ("Sheet1", vec![("Name", column(&["Alice"]))]),
            ("Sheet3", vec![("Name", column(&["Carol"]))]),
        ]);
        let result = execute(&source, &name_mapping()).unwrap();

        assert_eq!(
            result.unmapped,
            vec![UnmappedReport::Sheet {
                sheet: "Sheet3".into()
            }]
        );
        assert_eq!(result.output.len(), 1);
        assert!(!result.output.contains_key("Sheet3"));
    }

    #[test]
    fn test_unmapped_column() {
        let source = dataset(vec![(
            "Sheet1",
            vec![("Name", column(&["Alice"])), ("Age", column(&["30"]))],
        )]);
        let result = execute(&source, &name_mapping()).unwrap();

        assert_eq!(
            result.unmapped,
            vec![UnmappedReport::Column {
                sheet: "Sheet1".into(),
                column: "Age".into()
            }]
        );
        assert_eq!(result.output["Sheet2"].len(), 1);
    }

    #[test]
    fn test_matched_sheet_without_columns_creates_target() {
        let source = dataset(vec![("Sheet1", vec![("Age", column(&["30"]))])]);
        let result = execute(&source, &name_mapping()).unwrap();
        assert!(result.output["Sheet2"].is_empty());
    }

    #[test]
    fn test_translate_and_nulls() {
        let mapping = build_mapping(&[ConfigTable::new("People - Staff").with_row(
            ConfigRow::new("Gender", "Sex", "Translate")
                .with_element("M-Male")
                .with_element("F-Female"),
        )])
        .unwrap();
        let source = dataset(vec![(
            "People",
            vec![(
                "Gender",
                vec![
                    CellValue::text("M"),
                    CellValue::Null,
                    CellValue::text("F"),
                    CellValue::text("U"),
                ],
            )],
        )]);

        let result = execute(&source, &mapping).unwrap();
        assert_eq!(
            result.output["Staff"]["Sex"],
            vec![
                CellValue::text("Male"),
                CellValue::Null,
                CellValue::text("Female"),
                CellValue::Null
            ]
        );
    }

    #[test]
    fn test_last_write_wins() {
        let mapping = build_mapping(&[
            ConfigTable::new("A - T").with_row(ConfigRow::new("x", "v", "Copy")),
            ConfigTable::new("B - T").with_row(ConfigRow::new("y", "v", "Copy")),
        ])
        .unwrap();
        let source = dataset(vec![
            ("A", vec![("x", column(&["from-a"]))]),
            ("B", vec![("y", column(&["from-b"]))]),
        ]);

        let result = execute(&source, &mapping).unwrap();
        assert_eq!(result.output["T"]["v"], column(&["from-b"]));
        assert_eq!(
            result.overwritten,
            vec![OverwrittenColumn {
                target_sheet: "T".into(),
                target_column: "v".into(),
                source_sheet: "B".into(),
                source_column: "y".into(),
            }]
        );
    }

    #[test]
    fn test_unknown_rule_aborts() {
        let mapping = build_mapping(&[ConfigTable::new("A - B")
            .with_row(ConfigRow::new("x", "y", "Split"))])
        .unwrap();
        let source = dataset(vec![("A", vec![("x", column(&["1"]))])]);

        assert_eq!(
            execute(&source, &mapping).unwrap_err(),
            RuleError::UnknownRule("Split".into())
        );
    }

    #[test]
    fn test_unknown_rule_on_unused_column_is_harmless() {
        let mapping = build_mapping(&[ConfigTable::new("A - B")
            .with_row(ConfigRow::new("x", "y", "Copy"))
            .with_row(ConfigRow::new("z", "w", "Split"))])
        .unwrap();
        let source = dataset(vec![("A", vec![("x", column(&["1"]))])]);
        assert!(execute(&source, &mapping).is_ok());
    }

    #[test]
    fn test_reverse_then_execute() {
        let mapping = build_mapping(&[ConfigTable::new("People - Staff").with_row(
            ConfigRow::new("Gender", "Sex", "Translate").with_element("M-Male"),
        )])
        .unwrap()
        .reversed();
        let source = dataset(vec![("Staff", vec![("Sex", column(&["Male", "Female"]))])]);

        let result = execute(&source, &mapping).unwrap();
        assert_eq!(
            result.output["People"]["Gender"],
            vec![CellValue::text("M"), CellValue::Null]
        );
    }

    #[test]
    fn test_find_unmapped_matches_execute() {
        let source = dataset(vec![
            ("Sheet1", vec![("Name", column(&["a"])), ("Age", column(&["1"]))]),
            ("Sheet3", vec![("Name", column(&["b"]))]),
        ]);
        let mapping = name_mapping();

        let found = find_unmapped(&source, &mapping);
        assert_eq!(found, execute(&source, &mapping).unwrap().unmapped);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].to_string(), "Unmapped sheet: Sheet3");
    }

    #[test]
    fn test_summary() {
        let source = dataset(vec![("Sheet1", vec![("Name", column(&["a"]))])]);
        let result = execute(&source, &name_mapping()).unwrap();
        assert_eq!(
            result.summary(),
            "Transformed: 1 columns into 1 sheets, 0 unmapped, 0 overwritten"
        );
    }
}
