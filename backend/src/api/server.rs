//! HTTP Server for the sheetmap API.
//!
//! Provides REST endpoints for uploading a configuration workbook and a
//! source dataset and getting the migrated dataset back as JSON.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/transform`  | Transform `source` with `config`         |
//! | POST   | `/api/mapping`    | Mapping document built from `config`     |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |
//!
//! Multipart fields: `config` (`.xlsx`), `source` (`.xlsx` or `.csv`),
//! `direction` (`forward`/`reverse`, optional).

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::path::Path;
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, SourceMetadata, TransformResponse};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::{Dataset, Direction};
use crate::parser::parse_bytes_auto;
use crate::transform::mapping::MappingDocument;
use crate::transform::pipeline::{load_mapping, run, TransformOptions};
use crate::workbook::{DataSource, ExcelWorkbook};

type ApiError = (StatusCode, Json<Value>);

/// Build the router
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/transform", post(transform))
        .route("/api/mapping", post(mapping))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Sheetmap server running on http://localhost:{}", port);
    println!("   POST /api/transform - Transform a source workbook");
    println!("   POST /api/mapping   - Build a mapping document");
    println!("   GET  /api/logs      - SSE log stream");
    println!("   GET  /health        - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sheetmap",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "transform": "POST /api/transform",
            "mapping": "POST /api/mapping",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Uploads
// =============================================================================

/// An uploaded file
struct Upload {
    name: String,
    bytes: Vec<u8>,
}

impl Upload {
    fn is_csv(&self) -> bool {
        self.name.to_lowercase().ends_with(".csv")
    }

    fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string())
    }
}

#[derive(Default)]
struct UploadForm {
    config: Option<Upload>,
    source: Option<Upload>,
    direction: Option<Direction>,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
            .to_vec();

        match name.as_str() {
            "config" | "source" => {
                let upload = Upload {
                    name: file_name.unwrap_or_else(|| format!("{}.xlsx", name)),
                    bytes,
                };
                if name == "config" {
                    form.config = Some(upload);
                } else {
                    form.source = Some(upload);
                }
            }
            "direction" => {
                let value = String::from_utf8_lossy(&bytes);
                form.direction = Some(value.parse().map_err(ServerError::BadRequest)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn read_source(source: Upload) -> ServerResult<(Dataset, SourceMetadata)> {
    let mut metadata = SourceMetadata {
        file_name: source.name.clone(),
        ..Default::default()
    };

    if source.is_csv() {
        let parsed = parse_bytes_auto(&source.bytes).map_err(PipelineError::from)?;
        metadata.format = "csv".to_string();
        metadata.encoding = Some(parsed.encoding);
        metadata.delimiter = Some(parsed.delimiter.to_string());

        let mut dataset = Dataset::new();
        dataset.insert(source.stem(), parsed.sheet);
        return Ok((dataset, metadata));
    }

    metadata.format = "spreadsheet".to_string();
    let dataset = ExcelWorkbook::from_bytes(source.name, source.bytes)
        .and_then(|mut workbook| workbook.read_dataset())
        .map_err(PipelineError::from)?;
    Ok((dataset, metadata))
}

fn transform_uploads(
    config: Upload,
    source: Upload,
    direction: Direction,
) -> ServerResult<TransformResponse> {
    let mut workbook =
        ExcelWorkbook::from_bytes(config.name, config.bytes).map_err(PipelineError::from)?;
    let (mut dataset, metadata) = read_source(source)?;

    let options = TransformOptions::default().with_direction(direction);
    let result = run(&mut workbook, &mut dataset, &options)?;
    log_info(result.summary());

    Ok(TransformResponse::from_run(result, metadata))
}

fn mapping_document(config: Upload, direction: Direction) -> ServerResult<MappingDocument> {
    let mut workbook =
        ExcelWorkbook::from_bytes(config.name, config.bytes).map_err(PipelineError::from)?;
    let mapping = load_mapping(&mut workbook)?.oriented(direction);
    Ok(MappingDocument::from(mapping))
}

fn reject(err: ServerError) -> ApiError {
    log_error(err.to_string());
    let status = match &err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Io(_) | PipelineError::Json(_))
        | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(error_response(&err.to_string())))
}

/// Run blocking pipeline work off the async runtime.
async fn blocking<T, F>(work: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServerResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("Worker failed: {}", e)))?
}

fn default_direction() -> Direction {
    TransformOptions::from_env().direction
}

/// Transform endpoint
async fn transform(multipart: Multipart) -> Result<Json<TransformResponse>, ApiError> {
    let form = read_form(multipart).await.map_err(reject)?;
    let config = form
        .config
        .ok_or_else(|| reject(ServerError::BadRequest("No config file provided".into())))?;
    let source = form
        .source
        .ok_or_else(|| reject(ServerError::BadRequest("No source file provided".into())))?;
    let direction = form.direction.unwrap_or_else(default_direction);

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW TRANSFORM: {} with {} ({})",
        source.name, config.name, direction
    );
    println!("{}\n", "=".repeat(70));

    let response = blocking(move || transform_uploads(config, source, direction))
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

/// Mapping document endpoint
async fn mapping(multipart: Multipart) -> Result<Json<MappingDocument>, ApiError> {
    let form = read_form(multipart).await.map_err(reject)?;
    let config = form
        .config
        .ok_or_else(|| reject(ServerError::BadRequest("No config file provided".into())))?;
    let direction = form.direction.unwrap_or_else(default_direction);

    let document = blocking(move || mapping_document(config, direction))
        .await
        .map_err(reject)?;
    Ok(Json(document))
}
