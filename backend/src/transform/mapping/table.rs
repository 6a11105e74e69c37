//! Mapping table definition
//!
//! The mapping table is built from the configuration workbook and answers
//! "where does this source sheet/column go, and with which rule?".
//!
//! ```text
//! SheetPair("People", "Staff")
//!   ├── ColumnPair("Name", "FullName")  → Copy
//!   └── ColumnPair("Gender", "Sex")     → Translate [M→Male, F→Female]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{
    CellValue, ColumnPair, ConfigEntry, ConfigRow, ConfigTable, ElementPair, Rule, RuleSpec,
    SheetPair, LEFT_TITLE, RIGHT_TITLE, TRANS_TYPE,
};

/// Separator between source and target in sheet labels and element cells.
pub const PAIR_SEPARATOR: char = '-';

/// Current mapping document format version.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Column pairs of one sheet pair, with a first-match index on the source column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    rules: IndexMap<ColumnPair, RuleSpec>,
    by_source: HashMap<String, ColumnPair>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// First column pair (in insertion order) whose source is `source_column`.
    pub fn lookup(&self, source_column: &str) -> Option<(&ColumnPair, &RuleSpec)> {
        let key = self.by_source.get(source_column)?;
        self.rules.get_key_value(key)
    }

    /// Get the rule spec for an exact column pair.
    pub fn get(&self, pair: &ColumnPair) -> Option<&RuleSpec> {
        self.rules.get(pair)
    }

    /// Iterate over column pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnPair, &RuleSpec)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert a rule for `pair` unless the pair already has one, returning the
    /// stored spec. An existing spec keeps its rule.
    fn entry(&mut self, pair: ColumnPair, rule: Rule) -> &mut RuleSpec {
        self.by_source
            .entry(pair.source.clone())
            .or_insert_with(|| pair.clone());
        self.rules
            .entry(pair)
            .or_insert_with(|| RuleSpec::new(rule))
    }
}

/// A resolved column: where it goes and how it is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn<'a> {
    pub target_sheet: &'a str,
    pub target_column: &'a str,
    pub spec: &'a RuleSpec,
}

/// The complete two-level mapping: sheet pair → column pair → rule spec.
///
/// Sheet pairs and column pairs keep their configuration order. When several
/// sheet pairs share a source sheet (or several column pairs share a source
/// column), the first one inserted is the one lookups resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MappingDocument", into = "MappingDocument")]
pub struct MappingTable {
    groups: IndexMap<SheetPair, ColumnMapping>,
    by_source: HashMap<String, SheetPair>,
}

impl MappingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// First sheet pair (in insertion order) whose source is `source_sheet`.
    pub fn lookup_sheet(&self, source_sheet: &str) -> Option<(&SheetPair, &ColumnMapping)> {
        let key = self.by_source.get(source_sheet)?;
        self.groups.get_key_value(key)
    }

    /// Resolve a source sheet and column to its target and rule.
    pub fn lookup(&self, source_sheet: &str, source_column: &str) -> Option<ResolvedColumn<'_>> {
        let (sheets, columns) = self.lookup_sheet(source_sheet)?;
        let (pair, spec) = columns.lookup(source_column)?;
        Some(ResolvedColumn {
            target_sheet: &sheets.target,
            target_column: &pair.target,
            spec,
        })
    }

    /// Get the column mapping for an exact sheet pair.
    pub fn get(&self, pair: &SheetPair) -> Option<&ColumnMapping> {
        self.groups.get(pair)
    }

    /// Iterate over sheet pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SheetPair, &ColumnMapping)> {
        self.groups.iter()
    }

    pub fn sheet_pairs(&self) -> impl Iterator<Item = &SheetPair> {
        self.groups.keys()
    }

    /// Number of sheet pairs.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of column pairs across all sheet pairs.
    pub fn column_count(&self) -> usize {
        self.groups.values().map(ColumnMapping::len).sum()
    }

    /// Get or create the group for a sheet pair.
    pub(crate) fn group_mut(&mut self, pair: SheetPair) -> &mut ColumnMapping {
        self.by_source
            .entry(pair.source.clone())
            .or_insert_with(|| pair.clone());
        self.groups.entry(pair).or_default()
    }

    /// Add one parsed configuration entry.
    ///
    /// The first entry for a column pair fixes its rule. Element pairs of
    /// later `Translate` entries with the same key are appended to the same
    /// list.
    pub fn insert_entry(&mut self, entry: ConfigEntry) {
        let is_translate = entry.rule == Rule::Translate;
        let spec = self.group_mut(entry.sheets).entry(entry.columns, entry.rule);
        if is_translate {
            spec.elements.extend(entry.element_pairs);
        }
    }

    /// Insert a complete rule spec, with the same first-rule-wins semantics
    /// as [`MappingTable::insert_entry`].
    pub(crate) fn insert_spec(&mut self, sheets: SheetPair, columns: ColumnPair, spec: RuleSpec) {
        let stored = self.group_mut(sheets).entry(columns, spec.rule);
        stored.elements.extend(spec.elements);
    }

    /// Parse a mapping document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to a pretty-printed mapping document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build a mapping table from configuration tables.
///
/// Each table label is split into source and target sheet; each row
/// contributes one column pair. Fails on the first malformed label, row or
/// element cell.
pub fn build_mapping(tables: &[ConfigTable]) -> ConfigResult<MappingTable> {
    let mut mapping = MappingTable::new();

    for table in tables {
        let sheets = parse_sheet_pair(&table.label)?;
        // Group exists even when the table has no rows.
        mapping.group_mut(sheets.clone());

        for (idx, row) in table.rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            // Row numbers as the operator sees them: header is row 1.
            let entry = parse_entry(&table.label, idx + 2, &sheets, row)?;
            mapping.insert_entry(entry);
        }
    }

    Ok(mapping)
}

/// Split a `"Source - Target"` label into a trimmed sheet pair.
///
/// Both sheet names must be non-empty after trimming.
pub fn parse_sheet_pair(label: &str) -> ConfigResult<SheetPair> {
    split_pair(label)
        .filter(|(source, target)| !source.is_empty() && !target.is_empty())
        .map(|(source, target)| SheetPair::new(source, target))
        .ok_or_else(|| ConfigError::InvalidSheetPair {
            label: label.to_string(),
        })
}

/// Parse one configuration row.
///
/// `LeftTitle`, `RightTitle` and `TransType` are required; a whitespace-only
/// cell counts as missing.
pub fn parse_entry(
    table: &str,
    row_number: usize,
    sheets: &SheetPair,
    row: &ConfigRow,
) -> ConfigResult<ConfigEntry> {
    let field = |value: &CellValue, name: &str| {
        value
            .trimmed()
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingField {
                table: table.to_string(),
                row: row_number,
                field: name.to_string(),
            })
    };

    let source_column = field(&row.left_title, LEFT_TITLE)?;
    let target_column = field(&row.right_title, RIGHT_TITLE)?;
    let rule = Rule::parse(&field(&row.trans_type, TRANS_TYPE)?);

    let element_pairs = if rule == Rule::Translate {
        parse_element_cells(table, row_number, &row.elements)?
    } else {
        Vec::new()
    };

    Ok(ConfigEntry {
        sheets: sheets.clone(),
        columns: ColumnPair::new(source_column, target_column),
        rule,
        element_pairs,
    })
}

/// Parse every non-blank `source-target` cell into an element pair.
fn parse_element_cells(
    table: &str,
    row_number: usize,
    cells: &[CellValue],
) -> ConfigResult<Vec<ElementPair>> {
    cells
        .iter()
        .filter(|cell| !cell.is_blank())
        .filter_map(CellValue::as_str)
        .map(|cell| {
            split_pair(cell)
                .map(|(source, target)| ElementPair::new(source, target))
                .ok_or_else(|| ConfigError::InvalidElementPair {
                    table: table.to_string(),
                    row: row_number,
                    cell: cell.to_string(),
                })
        })
        .collect()
}

/// Split on [`PAIR_SEPARATOR`] into exactly two trimmed halves.
fn split_pair(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split(PAIR_SEPARATOR);
    let left = parts.next()?;
    let right = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((left.trim(), right.trim()))
}

// =============================================================================
// Mapping documents
// =============================================================================

/// Serializable form of a [`MappingTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub sheets: Vec<SheetMappingDocument>,
}

/// One sheet pair in a mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMappingDocument {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub columns: Vec<ColumnMappingDocument>,
}

/// One column pair in a mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMappingDocument {
    pub source: String,
    pub target: String,
    pub rule: Rule,
    #[serde(default)]
    pub elements: Vec<ElementPair>,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl From<MappingTable> for MappingDocument {
    fn from(table: MappingTable) -> Self {
        let sheets = table
            .groups
            .into_iter()
            .map(|(pair, columns)| SheetMappingDocument {
                source: pair.source,
                target: pair.target,
                columns: columns
                    .rules
                    .into_iter()
                    .map(|(column, spec)| ColumnMappingDocument {
                        source: column.source,
                        target: column.target,
                        rule: spec.rule,
                        elements: spec.elements,
                    })
                    .collect(),
            })
            .collect();

        MappingDocument {
            version: default_version(),
            sheets,
        }
    }
}

impl From<MappingDocument> for MappingTable {
    fn from(document: MappingDocument) -> Self {
        let mut table = MappingTable::new();
        for sheet in document.sheets {
            let sheets = SheetPair::new(sheet.source, sheet.target);
            table.group_mut(sheets.clone());
            for column in sheet.columns {
                table.insert_spec(
                    sheets.clone(),
                    ColumnPair::new(column.source, column.target),
                    RuleSpec {
                        rule: column.rule,
                        elements: column.elements,
                    },
                );
            }
        }
        table
    }
}
