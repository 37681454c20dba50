//! Types for the film lab HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur at the film lab API boundary.
///
/// Validation and session-state preconditions are checked before any request
/// is sent and live in `orchestrator::WorkflowError`; this enum covers only
/// the network-level failure classes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached a server (connect failure, timeout).
    #[error("network unreachable: {0}")]
    Transport(String),

    /// The server responded with a failure status.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The server responded with a success status but an unusable body.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Color rendition of a film stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmType {
    Color,
    Bw,
}

impl FilmType {
    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmType::Color => "color",
            FilmType::Bw => "bw",
        }
    }
}

/// A ranked film recommendation returned by the matcher.
///
/// The server returns candidates best-first; insertion order is rank order
/// and `score` is for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmCandidate {
    pub film_id: u32,
    pub film_name: String,
    pub manufacturer: String,
    /// Catalog tier label (`mvp`, `core`, `extended`).
    pub tier: String,
    /// Suitability score in the 0-100 range.
    pub score: f64,
    /// Free-text justification from the matcher.
    pub reason: String,
    /// Base sensitivity (ISO) of the film stock.
    pub iso_base: u32,
    #[serde(rename = "type")]
    pub film_type: FilmType,
}

/// One uploaded image as echoed back by the intake endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    /// Extracted EXIF fields; shape is owned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<serde_json::Value>,
    #[serde(default)]
    pub matched_films: Vec<FilmCandidate>,
}

/// Response body of `POST /upload`.
///
/// `job_id` and `images` are defaulted rather than required so that shape
/// violations surface as specific orchestrator messages instead of opaque
/// decode errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub images: Vec<UploadedImage>,
}

/// Request body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub job_id: String,
    pub film_ids: Vec<u32>,
}

/// Per-film render status as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Success,
    Failed,
    /// Any unrecognized status string; treated as a failure.
    #[serde(other)]
    Unknown,
}

/// One film's render outcome as reported on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResultWire {
    pub film_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_name: Option<String>,
    pub status: RenderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

/// Response body of `POST /process`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    /// Server-reported success count; the derived partition is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u32>,
    /// A missing field (as opposed to an empty list) marks the response
    /// malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RenderResultWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// The photograph submitted for matching and rendering.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Create a payload, guessing the content type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = match file_name.rsplit('.').next().map(str::to_ascii_lowercase) {
            Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
            Some(ext) if ext == "png" => "image/png",
            Some(ext) if ext == "tif" || ext == "tiff" => "image/tiff",
            _ => "application/octet-stream",
        }
        .to_string();

        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Filters for the film catalog listing.
#[derive(Debug, Clone, Default)]
pub struct FilmFilter {
    /// Tier filter (`mvp`, `core`, `extended`, `all`).
    pub tier: Option<String>,
    /// Type filter (`color`, `bw`, `all`).
    pub film_type: Option<String>,
}

/// A film catalog entry (`GET /films`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: u32,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub film_type: FilmType,
    pub iso_base: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tier: String,
    /// Developing recipes; shape is owned by the server.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: Vec<serde_json::Value>,
}

/// Response body of `GET /films`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmListing {
    pub count: u32,
    #[serde(default)]
    pub films: Vec<FilmRecord>,
}

/// Response body of `GET /films/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmDetail {
    pub film: FilmRecord,
}

/// Response body of `GET /jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: String,
    pub original_count: u32,
    pub processed_count: u32,
    /// `uploaded` or `completed`.
    pub status: String,
}

/// Trait for film lab API backends.
///
/// The orchestrator is generic over this seam so tests can run against
/// `testing::MockFilmLabApi` without real infrastructure.
#[async_trait]
pub trait FilmLabApi: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Upload one photograph for EXIF analysis and film matching.
    async fn upload(&self, payload: ImagePayload) -> Result<UploadResponse, ApiError>;

    /// Batch-render the uploaded photo through the given films in one call.
    async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse, ApiError>;

    /// List the film catalog, optionally filtered by tier and type.
    async fn list_films(&self, filter: &FilmFilter) -> Result<FilmListing, ApiError>;

    /// Fetch one film's catalog entry.
    async fn film(&self, film_id: u32) -> Result<FilmDetail, ApiError>;

    /// Fetch upload/render progress for a job.
    async fn job_info(&self, job_id: &str) -> Result<JobInfo, ApiError>;

    /// Fetch a rendered artifact (or the ZIP bundle) as raw bytes.
    ///
    /// Accepts either a relative artifact path or an absolute URL.
    async fn fetch_artifact(&self, path: &str) -> Result<Vec<u8>, ApiError>;

    /// Resolve a relative artifact path against the API origin.
    fn artifact_url(&self, path: &str) -> String;

    /// URL of the all-films ZIP bundle for a job.
    fn bundle_url(&self, job_id: &str) -> String;
}
