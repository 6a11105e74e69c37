//! Domain models for the sheetmap migration pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`CellValue`] - A cell value or the explicit "no value" sentinel
//! - [`SheetPair`] / [`ColumnPair`] - Composite source → target keys
//! - [`Rule`] / [`RuleSpec`] / [`ElementPair`] - How a column is transformed
//! - [`ConfigTable`] / [`ConfigRow`] / [`ConfigEntry`] - Raw and parsed configuration
//! - [`Dataset`] - Sheets of named columns, used for both input and output
//! - [`Direction`] - Whether the mapping is applied as written or reversed

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Cell Values
// =============================================================================

/// A single cell value.
///
/// Empty cells and untranslatable elements are [`CellValue::Null`], which is
/// distinct from both the empty string and the literal text `"null"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum CellValue {
    /// No value.
    #[default]
    Null,
    /// Text content of the cell.
    Text(String),
}

impl CellValue {
    /// Create a text value.
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Get the text if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Null => None,
        }
    }

    /// Check for the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Trimmed text, or `None` when the cell is blank.
    pub fn trimmed(&self) -> Option<&str> {
        self.as_str().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => CellValue::Text(s),
            None => CellValue::Null,
        }
    }
}

impl From<CellValue> for Option<String> {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Text(s) => Some(s),
            CellValue::Null => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Composite Keys
// =============================================================================

/// A source sheet and the target sheet it migrates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetPair {
    pub source: String,
    pub target: String,
}

impl SheetPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The same pair read in the opposite direction.
    pub fn swapped(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }
}

impl fmt::Display for SheetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.source, self.target)
    }
}

/// A source column and the target column it migrates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnPair {
    pub source: String,
    pub target: String,
}

impl ColumnPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The same pair read in the opposite direction.
    pub fn swapped(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }
}

/// One element substitution used by [`Rule::Translate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementPair {
    pub source: String,
    pub target: String,
}

impl ElementPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Transformation strategy for a column.
///
/// Rule names that the engine does not know are kept verbatim in
/// [`Rule::Unknown`] so the configuration still loads; applying such a rule
/// fails with [`crate::error::RuleError::UnknownRule`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rule {
    /// Values are carried over unchanged.
    Copy,
    /// Values are substituted through the element pairs.
    Translate,
    /// Any other rule name found in the configuration.
    Unknown(String),
}

impl Rule {
    /// Parse a rule name. Matching is exact and case-sensitive.
    pub fn parse(name: &str) -> Self {
        match name {
            "Copy" => Rule::Copy,
            "Translate" => Rule::Translate,
            other => Rule::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Rule::Copy => "Copy",
            Rule::Translate => "Translate",
            Rule::Unknown(name) => name,
        }
    }
}

impl From<String> for Rule {
    fn from(value: String) -> Self {
        Rule::parse(&value)
    }
}

impl From<Rule> for String {
    fn from(value: Rule) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule and element dictionary attached to one column pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub rule: Rule,
    #[serde(default)]
    pub elements: Vec<ElementPair>,
}

impl RuleSpec {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, source: &str, target: &str) -> Self {
        self.elements.push(ElementPair::new(source, target));
        self
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Header of the source column field in a configuration sheet.
pub const LEFT_TITLE: &str = "LeftTitle";
/// Header of the target column field in a configuration sheet.
pub const RIGHT_TITLE: &str = "RightTitle";
/// Header of the rule field in a configuration sheet.
pub const TRANS_TYPE: &str = "TransType";

/// One configuration sheet, named `"<SourceSheet> - <TargetSheet>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTable {
    pub label: String,
    pub rows: Vec<ConfigRow>,
}

impl ConfigTable {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: ConfigRow) -> Self {
        self.rows.push(row);
        self
    }
}

/// One raw row of a configuration sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRow {
    pub left_title: CellValue,
    pub right_title: CellValue,
    pub trans_type: CellValue,
    /// Trailing `source-target` element cells, in column order.
    #[serde(default)]
    pub elements: Vec<CellValue>,
}

impl ConfigRow {
    pub fn new(left_title: &str, right_title: &str, trans_type: &str) -> Self {
        Self {
            left_title: left_title.into(),
            right_title: right_title.into(),
            trans_type: trans_type.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, cell: impl Into<CellValue>) -> Self {
        self.elements.push(cell.into());
        self
    }

    /// All cells empty, including trailing ones.
    pub fn is_empty(&self) -> bool {
        self.left_title.is_blank()
            && self.right_title.is_blank()
            && self.trans_type.is_blank()
            && self.elements.iter().all(CellValue::is_blank)
    }
}

/// A configuration row after trimming and element parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub sheets: SheetPair,
    pub columns: ColumnPair,
    pub rule: Rule,
    /// Only populated when `rule` is [`Rule::Translate`].
    pub element_pairs: Vec<ElementPair>,
}

// =============================================================================
// Datasets
// =============================================================================

/// Columns of one sheet, in column order.
pub type SheetData = IndexMap<String, Vec<CellValue>>;

/// Sheets of a workbook, in sheet order.
pub type Dataset = IndexMap<String, SheetData>;

/// Dataset read from the input workbook.
pub type SourceDataset = Dataset;

/// Dataset produced by the transformation engine.
pub type OutputDataset = Dataset;

/// Number of rows in the longest column of a sheet.
pub fn row_count(sheet: &SheetData) -> usize {
    sheet.values().map(Vec::len).max().unwrap_or(0)
}

// =============================================================================
// Direction
// =============================================================================

/// Whether the configuration is applied left-to-right or right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Source sheets on the left of each label, as written.
    #[default]
    Forward,
    /// The whole mapping is reversed before use.
    Reverse,
}

impl Direction {
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Reverse)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" | "ltr" | "left-to-right" | "1" => Ok(Direction::Forward),
            "reverse" | "rtl" | "right-to-left" | "2" => Ok(Direction::Reverse),
            other => Err(format!(
                "invalid direction '{}': expected 'forward' (1) or 'reverse' (2)",
                other
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Reverse => f.write_str("reverse"),
        }
    }
}
