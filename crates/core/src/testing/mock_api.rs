use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::api::{
    ApiError, FilmDetail, FilmFilter, FilmLabApi, FilmListing, FilmRecord, ImagePayload, JobInfo,
    ProcessRequest, ProcessResponse, UploadResponse,
};

/// What the mock remembers about an upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub file_name: String,
    pub size_bytes: u64,
}

/// Scripted in-memory stand-in for the film lab API.
///
/// Responses are enqueued per endpoint and consumed in order; an optional
/// delay per response lets tests interleave slow and fast calls. Every call
/// is recorded at entry, before any delay, so tests can assert on request
/// order and content.
#[derive(Clone, Default)]
pub struct MockFilmLabApi {
    upload_responses: Arc<RwLock<VecDeque<(Duration, Result<UploadResponse, ApiError>)>>>,
    process_responses: Arc<RwLock<VecDeque<(Duration, Result<ProcessResponse, ApiError>)>>>,
    films: Arc<RwLock<Vec<FilmRecord>>>,
    artifacts: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    job_infos: Arc<RwLock<HashMap<String, JobInfo>>>,
    recorded_uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    recorded_process: Arc<RwLock<Vec<ProcessRequest>>>,
}

impl MockFilmLabApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue_upload(&self, result: Result<UploadResponse, ApiError>) {
        self.enqueue_upload_delayed(Duration::ZERO, result).await;
    }

    pub async fn enqueue_upload_delayed(
        &self,
        delay: Duration,
        result: Result<UploadResponse, ApiError>,
    ) {
        self.upload_responses.write().await.push_back((delay, result));
    }

    pub async fn enqueue_process(&self, result: Result<ProcessResponse, ApiError>) {
        self.enqueue_process_delayed(Duration::ZERO, result).await;
    }

    pub async fn enqueue_process_delayed(
        &self,
        delay: Duration,
        result: Result<ProcessResponse, ApiError>,
    ) {
        self.process_responses.write().await.push_back((delay, result));
    }

    pub async fn set_films(&self, films: Vec<FilmRecord>) {
        *self.films.write().await = films;
    }

    pub async fn insert_artifact(&self, path: &str, bytes: Vec<u8>) {
        self.artifacts.write().await.insert(path.to_string(), bytes);
    }

    pub async fn insert_job_info(&self, info: JobInfo) {
        self.job_infos
            .write()
            .await
            .insert(info.job_id.clone(), info);
    }

    pub async fn upload_count(&self) -> usize {
        self.recorded_uploads.read().await.len()
    }

    pub async fn process_count(&self) -> usize {
        self.recorded_process.read().await.len()
    }

    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.recorded_uploads.read().await.clone()
    }

    pub async fn recorded_process(&self) -> Vec<ProcessRequest> {
        self.recorded_process.read().await.clone()
    }
}

#[async_trait]
impl FilmLabApi for MockFilmLabApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, payload: ImagePayload) -> Result<UploadResponse, ApiError> {
        self.recorded_uploads.write().await.push(RecordedUpload {
            file_name: payload.file_name.clone(),
            size_bytes: payload.size_bytes(),
        });

        let scripted = self.upload_responses.write().await.pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(ApiError::Transport(
                "mock: no scripted upload response".to_string(),
            )),
        }
    }

    async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse, ApiError> {
        self.recorded_process.write().await.push(request.clone());

        let scripted = self.process_responses.write().await.pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(ApiError::Transport(
                "mock: no scripted process response".to_string(),
            )),
        }
    }

    async fn list_films(&self, filter: &FilmFilter) -> Result<FilmListing, ApiError> {
        let films: Vec<FilmRecord> = self
            .films
            .read()
            .await
            .iter()
            .filter(|f| match filter.tier.as_deref() {
                Some("all") | None => true,
                Some(tier) => f.tier == tier,
            })
            .filter(|f| match filter.film_type.as_deref() {
                Some("all") | None => true,
                Some(film_type) => f.film_type.as_str() == film_type,
            })
            .cloned()
            .collect();

        Ok(FilmListing {
            count: films.len() as u32,
            films,
        })
    }

    async fn film(&self, film_id: u32) -> Result<FilmDetail, ApiError> {
        self.films
            .read()
            .await
            .iter()
            .find(|f| f.id == film_id)
            .cloned()
            .map(|film| FilmDetail { film })
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: format!("film {} not found", film_id),
            })
    }

    async fn job_info(&self, job_id: &str) -> Result<JobInfo, ApiError> {
        self.job_infos
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: format!("job {} not found", job_id),
            })
    }

    async fn fetch_artifact(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.artifacts
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: format!("artifact {} not found", path),
            })
    }

    fn artifact_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("http://localhost:5000{}", path)
        } else {
            format!("http://localhost:5000/{}", path)
        }
    }

    fn bundle_url(&self, job_id: &str) -> String {
        format!("http://localhost:5000/api/download/{}/all_films.zip", job_id)
    }
}
