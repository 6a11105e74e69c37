//! CSV sheet parser with encoding and delimiter auto-detection.
//!
//! Converts a CSV file into one column-oriented sheet and back. Empty cells
//! become [`CellValue::Null`]. No mapping logic here.

use std::path::Path;

use crate::models::{row_count, CellValue, SheetData};

/// CSV parsing error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        CsvError::new(line, err.to_string())
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed columns, in header order
    pub sheet: SheetData,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
    /// Number of data rows
    pub row_count: usize,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gbk".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "gbk" => encoding_rs::GBK.decode(bytes).0.to_string(),
        // UTF-8 and unknown encodings: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text into a column-oriented sheet with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use sheetmap::parser::parse_sheet;
///
/// let sheet = parse_sheet("name;age\nAlice;30\nBob;", ';').unwrap();
///
/// assert_eq!(sheet["name"].len(), 2);
/// assert!(sheet["age"][1].is_null());
/// ```
pub fn parse_sheet(content: &str, delimiter: char) -> Result<SheetData, CsvError> {
    parse_string_with_metadata(content, delimiter, "utf-8".to_string()).map(|r| r.sheet)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> Result<ParseResult, CsvError> {
    if content.trim().is_empty() {
        return Err(CsvError::new(1, "Empty CSV file"));
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::new(0, format!("Delimiter '{}' is not ASCII", delimiter)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(CsvError::from)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(CsvError::new(1, "No headers found"));
    }

    if let Some(duplicate) = headers
        .iter()
        .enumerate()
        .find(|(i, h)| headers[..*i].contains(h))
        .map(|(_, h)| h.clone())
    {
        return Err(CsvError::new(1, "Duplicate column header").with_column(duplicate));
    }

    let mut sheet: SheetData = headers.iter().map(|h| (h.clone(), Vec::new())).collect();
    let mut rows = 0;
    for record in reader.records() {
        let record = record.map_err(CsvError::from)?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        // Non-empty cells past the header get their own column, null in
        // earlier rows.
        let width = record
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.trim().is_empty())
            .map(|(i, _)| i + 1)
            .last()
            .unwrap_or(0);
        while headers.len() < width {
            let name = unnamed_header(&headers, headers.len());
            sheet.insert(name.clone(), vec![CellValue::Null; rows]);
            headers.push(name);
        }

        for (i, values) in sheet.values_mut().enumerate() {
            let cell = match record.get(i) {
                Some(field) if !field.trim().is_empty() => CellValue::text(field.trim()),
                _ => CellValue::Null,
            };
            values.push(cell);
        }
        rows += 1;
    }

    Ok(ParseResult {
        sheet,
        encoding,
        delimiter,
        headers,
        row_count: rows,
    })
}

/// `Unnamed: <index>`, suffixed with `.1`, `.2`... if a header already has that name.
fn unnamed_header(headers: &[String], index: usize) -> String {
    let base = format!("Unnamed: {}", index);
    let mut name = base.clone();
    let mut suffix = 1;
    while headers.contains(&name) {
        name = format!("{}.{}", base, suffix);
        suffix += 1;
    }
    name
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    // Detect encoding
    let encoding = detect_encoding(bytes);

    // Decode content
    let content = decode_content(bytes, &encoding);

    // Detect delimiter
    let delimiter = detect_delimiter(&content);

    // Parse with detected settings
    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/people.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.row_count);
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> Result<ParseResult, CsvError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| CsvError::new(0, format!("Cannot read file: {}", e)))?;

    parse_bytes_auto(&bytes)
}

/// Render a sheet as UTF-8 CSV. Shorter columns are padded with empty cells.
pub fn sheet_to_csv(sheet: &SheetData, delimiter: char) -> Result<Vec<u8>, CsvError> {
    if !delimiter.is_ascii() {
        return Err(CsvError::new(0, format!("Delimiter '{}' is not ASCII", delimiter)));
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(Vec::new());

    writer.write_record(sheet.keys()).map_err(CsvError::from)?;

    for row in 0..row_count(sheet) {
        let record = sheet.values().map(|values| match values.get(row) {
            Some(CellValue::Text(s)) => s.as_str(),
            _ => "",
        });
        writer.write_record(record).map_err(CsvError::from)?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::new(0, format!("Cannot flush CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_csv() {
        let sheet = parse_sheet("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet["name"], vec![CellValue::text("Alice"), CellValue::text("Bob")]);
        assert_eq!(sheet["age"], vec![CellValue::text("30"), CellValue::text("25")]);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,value\n\"Smith, Jane\",\"Hello World\"";
        let sheet = parse_sheet(csv, ',').unwrap();

        assert_eq!(sheet["name"][0], CellValue::text("Smith, Jane"));
        assert_eq!(sheet["value"][0], CellValue::text("Hello World"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let sheet = parse_sheet("a;b\n1;2\n\n;\n3;4\n", ';').unwrap();
        assert_eq!(sheet["a"].len(), 2);
    }

    #[test]
    fn test_missing_values_are_null() {
        let sheet = parse_sheet("a;b;c\n1;;3\n4", ';').unwrap();

        assert_eq!(sheet["a"], vec![CellValue::text("1"), CellValue::text("4")]);
        assert_eq!(sheet["b"], vec![CellValue::Null, CellValue::Null]);
        assert_eq!(sheet["c"], vec![CellValue::text("3"), CellValue::Null]);
    }

    #[test]
    fn test_wide_rows_get_unnamed_columns() {
        let result = parse_string_with_metadata("a,b\n1,2\n3,4,5\n6,7,8,9\n", ',', "utf-8".into())
            .unwrap();
        let sheet = &result.sheet;

        assert_eq!(result.headers, vec!["a", "b", "Unnamed: 2", "Unnamed: 3"]);
        assert_eq!(
            sheet.keys().collect::<Vec<_>>(),
            vec!["a", "b", "Unnamed: 2", "Unnamed: 3"]
        );
        assert_eq!(
            sheet["Unnamed: 2"],
            vec![CellValue::Null, CellValue::text("5"), CellValue::text("8")]
        );
        assert_eq!(
            sheet["Unnamed: 3"],
            vec![CellValue::Null, CellValue::Null, CellValue::text("9")]
        );
        assert_eq!(sheet["a"].len(), 3);
    }

    #[test]
    fn test_unnamed_column_avoids_existing_header() {
        let sheet = parse_sheet("Unnamed: 1\nx,y\n", ',').unwrap();
        assert_eq!(sheet["Unnamed: 1"], vec![CellValue::text("x")]);
        assert_eq!(sheet["Unnamed: 1.1"], vec![CellValue::text("y")]);
    }

    #[test]
    fn test_trailing_empty_cells_add_no_columns() {
        let sheet = parse_sheet("a,b\n1,2,,\n", ',').unwrap();
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_literal_null_text_is_kept() {
        let sheet = parse_sheet("a\nnull", ',').unwrap();
        assert_eq!(sheet["a"], vec![CellValue::text("null")]);
    }

    #[test]
    fn test_duplicate_header() {
        let err = parse_sheet("a;a\n1;2", ';').unwrap_err();
        assert_eq!(err.column.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_csv_error() {
        let err = parse_sheet("", ';').unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(1, "Duplicate column header").with_column("age");
        assert_eq!(err.to_string(), "Line 1, column 'age': Duplicate column header");
        assert_eq!(CsvError::new(5, "Empty CSV file").to_string(), "Line 5: Empty CSV file");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto("name;age\nAlice;30\nBob;25".as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.row_count, 2);
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let result = parse_bytes_auto(b"\xEF\xBB\xBFname,age\nAlice,30").unwrap();
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_sheet_to_csv_pads_short_columns() {
        let mut sheet = SheetData::new();
        sheet.insert("a".into(), vec![CellValue::text("1"), CellValue::text("2")]);
        sheet.insert("b".into(), vec![CellValue::Null]);

        let bytes = sheet_to_csv(&sheet, ',').unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b\n1,\n2,\n");
    }
}
