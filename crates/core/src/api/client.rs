use async_trait::async_trait;
use reqwest::multipart;
use tracing::debug;

use crate::config::ApiConfig;

use super::types::{
    ApiError, FilmDetail, FilmFilter, FilmLabApi, FilmListing, ImagePayload, JobInfo,
    ProcessRequest, ProcessResponse, UploadResponse,
};

/// HTTP client for the film lab API.
pub struct FilmLabClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl FilmLabClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    /// Base URL without a trailing slash, e.g. `http://localhost:5000/api`.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// The server origin, i.e. the base URL with the `/api` prefix removed.
    /// Artifact paths returned by the server are relative to this.
    fn origin(&self) -> &str {
        let base = self.base_url();
        base.strip_suffix("/api").unwrap_or(base)
    }

    fn transport_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            ApiError::Transport(format!("connection failed: {}", e))
        } else {
            ApiError::Transport(e.to_string())
        }
    }

    /// Turn a non-success response into `ApiError::Server`, pulling the
    /// message out of the JSON body when the server provides one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            message: extract_error_message(&body, status.as_u16()),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

/// Prefer the `error` field, then `message`, then an HTTP status fallback.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    format!("HTTP {}", status)
}

#[async_trait]
impl FilmLabApi for FilmLabClient {
    fn name(&self) -> &str {
        "filmlab"
    }

    async fn upload(&self, payload: ImagePayload) -> Result<UploadResponse, ApiError> {
        let url = format!("{}/upload", self.base_url());
        debug!(
            "Uploading {} ({} bytes) to {}",
            payload.file_name,
            payload.size_bytes(),
            url
        );

        let part = multipart::Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.content_type)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("images", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse, ApiError> {
        let url = format!("{}/process", self.base_url());
        debug!(
            "Requesting renders for job {} with {} films",
            request.job_id,
            request.film_ids.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn list_films(&self, filter: &FilmFilter) -> Result<FilmListing, ApiError> {
        let url = format!("{}/films", self.base_url());

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(tier) = filter.tier.as_deref() {
            query.push(("tier", tier));
        }
        if let Some(film_type) = filter.film_type.as_deref() {
            query.push(("type", film_type));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn film(&self, film_id: u32) -> Result<FilmDetail, ApiError> {
        let url = format!("{}/films/{}", self.base_url(), film_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn job_info(&self, job_id: &str) -> Result<JobInfo, ApiError> {
        let url = format!("{}/jobs/{}", self.base_url(), job_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn fetch_artifact(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.artifact_url(path)
        };
        debug!("Fetching artifact from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn artifact_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin(), path)
        } else {
            format!("{}/{}", self.origin(), path)
        }
    }

    // The ZIP bundle is served under the API prefix, unlike render artifacts
    // which hang off the origin.
    fn bundle_url(&self, job_id: &str) -> String {
        format!("{}/download/{}/all_films.zip", self.base_url(), job_id)
    }
}
