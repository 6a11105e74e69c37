//! REST API types.
//!
//! The transformed dataset is returned as nested JSON: sheet name, then
//! column name, then the column values (`null` for empty cells).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Dataset, Direction};
use crate::transform::mapping::{OverwrittenColumn, UnmappedReport};
use crate::transform::pipeline::{RunOutput, RunStats};

/// Response sent after a configuration and a source upload are transformed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" (everything mapped), "warning" (unmapped or
    /// overwritten items), "error"
    pub status: String,

    /// Target sheets, in output order
    pub sheets: Dataset,

    /// Source sheets and columns the mapping does not cover
    pub unmapped: Vec<UnmappedReport>,

    /// Target columns written more than once
    pub overwritten: Vec<OverwrittenColumn>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the transformation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub direction: Direction,
    pub generated_at: String,
    pub stats: RunStats,
    /// How the source upload was read
    pub source: SourceMetadata,
}

/// Source upload metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub file_name: String,
    /// "spreadsheet" or "csv"
    pub format: String,
    /// CSV only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// CSV only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl TransformResponse {
    pub fn from_run(result: RunOutput, source: SourceMetadata) -> Self {
        let report = result.report();
        let status = if result.unmapped.is_empty() && result.overwritten.is_empty() {
            "ready"
        } else {
            "warning"
        };

        TransformResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            sheets: result.output,
            unmapped: result.unmapped,
            overwritten: result.overwritten,
            metadata: ResponseMetadata {
                direction: result.direction,
                generated_at: report.generated_at,
                stats: report.stats,
                source,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "sheets": {},
        "unmapped": [],
        "overwritten": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, SheetData};

    fn run_output(unmapped: Vec<UnmappedReport>) -> RunOutput {
        let mut sheet = SheetData::new();
        sheet.insert("FullName".into(), vec![CellValue::text("Alice"), CellValue::Null]);
        let mut output = Dataset::new();
        output.insert("Staff".into(), sheet);

        RunOutput {
            output,
            unmapped,
            overwritten: Vec::new(),
            direction: Direction::Forward,
            stats: RunStats::default(),
        }
    }

    #[test]
    fn test_ready_response() {
        let response = TransformResponse::from_run(run_output(Vec::new()), SourceMetadata::default());
        assert_eq!(response.status, "ready");
        assert!(Uuid::parse_str(&response.job_id).is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sheets"]["Staff"]["FullName"], json!(["Alice", null]));
        assert_eq!(json["metadata"]["direction"], "forward");
        assert!(json["metadata"]["source"].get("encoding").is_none());
    }

    #[test]
    fn test_warning_response() {
        let unmapped = vec![UnmappedReport::Sheet {
            sheet: "Sheet3".into(),
        }];
        let response = TransformResponse::from_run(run_output(unmapped), SourceMetadata::default());
        assert_eq!(response.status, "warning");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["unmapped"][0], json!({ "kind": "sheet", "sheet": "Sheet3" }));
    }

    #[test]
    fn test_error_response() {
        let json = error_response("boom");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
    }
}
