use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{
    FilmLabApi, ImagePayload, ProcessRequest, RenderResultWire, RenderStatus, UploadResponse,
};
use crate::config::IntakeConfig;
use crate::session::{BatchSummary, RenderOutcome, Session, SessionStatus};

use super::intake;
use super::types::{IntakeOutcome, IntakeReceipt, ProcessOutcome, WorkflowError};

/// Upper bound on films rendered per batch; candidates beyond this are
/// dropped in rank order.
const MAX_CANDIDATE_FILMS: usize = 5;

/// Drives one photo through upload, matching, and batch rendering.
///
/// All session mutation goes through this type; callers observe progress via
/// [`WorkflowOrchestrator::session`] snapshots. Submissions carry a monotonic
/// sequence number so that a response arriving after a newer submit has
/// started is discarded instead of clobbering the newer session.
pub struct WorkflowOrchestrator<A: FilmLabApi> {
    api: A,
    intake_config: IntakeConfig,
    session: RwLock<Session>,
    intake_seq: AtomicU64,
}

impl<A: FilmLabApi> WorkflowOrchestrator<A> {
    pub fn new(api: A, intake_config: IntakeConfig) -> Self {
        Self {
            api,
            intake_config,
            session: RwLock::new(Session::default()),
            intake_seq: AtomicU64::new(0),
        }
    }

    /// The underlying API backend, e.g. for fetching artifacts.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Discard the session and return to idle.
    ///
    /// Also invalidates any in-flight request so its late response is
    /// discarded.
    pub async fn reset(&self) {
        self.intake_seq.fetch_add(1, Ordering::SeqCst);
        let mut session = self.session.write().await;
        *session = Session::default();
        info!("Session reset");
    }

    /// Apply `mutate` only if no newer submission has started since `seq`
    /// was taken. Returns whether the mutation was applied.
    async fn apply_if_current<F>(&self, seq: u64, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.session.write().await;
        if self.intake_seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        mutate(&mut session);
        true
    }

    /// Submit a photo for EXIF analysis and film matching.
    ///
    /// Allowed from any state; an accepted intake replaces the session
    /// wholesale. Local validation failures are recorded on the session and
    /// never produce a network request.
    pub async fn submit(&self, payload: ImagePayload) -> Result<IntakeOutcome, WorkflowError> {
        if let Err(e) = intake::validate(&payload, &self.intake_config) {
            warn!("Rejected {}: {}", payload.file_name, e);
            let mut session = self.session.write().await;
            session.error = Some(e.to_string());
            return Err(e);
        }

        let seq = self.intake_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let prior_status = {
            let mut session = self.session.write().await;
            let prior = session.status;
            session.status = SessionStatus::Uploading;
            session.error = None;
            prior
        };
        info!(
            "Uploading {} ({} bytes) via {}",
            payload.file_name,
            payload.size_bytes(),
            self.api.name()
        );

        let response = match self.api.upload(payload).await {
            Ok(response) => response,
            Err(e) => return self.fail_intake(seq, prior_status, e.into()).await,
        };

        let receipt = match validate_upload_response(response) {
            Ok(receipt) => receipt,
            Err(e) => return self.fail_intake(seq, prior_status, e).await,
        };

        info!(
            "Job {} matched {} candidate films",
            receipt.job_id,
            receipt.candidate_films.len()
        );
        let applied = self
            .apply_if_current(seq, |session| {
                *session = Session {
                    job_id: Some(receipt.job_id.clone()),
                    candidate_films: receipt.candidate_films.clone(),
                    results: Vec::new(),
                    status: SessionStatus::Matched,
                    error: None,
                };
            })
            .await;

        if applied {
            Ok(IntakeOutcome::Accepted(receipt))
        } else {
            debug!("Discarding superseded upload response");
            Ok(IntakeOutcome::Superseded)
        }
    }

    /// Record an intake failure, restoring the status held before the upload
    /// started. A stale failure is reported as superseded instead.
    async fn fail_intake(
        &self,
        seq: u64,
        prior_status: SessionStatus,
        error: WorkflowError,
    ) -> Result<IntakeOutcome, WorkflowError> {
        warn!("Upload failed ({}): {}", error.kind(), error);
        let applied = self
            .apply_if_current(seq, |session| {
                session.status = prior_status;
                session.error = Some(error.to_string());
            })
            .await;

        if applied {
            Err(error)
        } else {
            debug!("Discarding superseded upload failure");
            Ok(IntakeOutcome::Superseded)
        }
    }

    /// Render the uploaded photo through every candidate film in one batch.
    ///
    /// Per-film failures are data, not errors: the call succeeds whenever
    /// the batch response is usable, and failures appear in the summary and
    /// as an advisory message on the session. A batch whose photo was
    /// re-submitted mid-flight resolves to
    /// [`ProcessOutcome::Superseded`], same as the intake path.
    pub async fn process_all(&self) -> Result<ProcessOutcome, WorkflowError> {
        let seq = self.intake_seq.load(Ordering::SeqCst);
        let (prior_status, request) = {
            let mut session = self.session.write().await;

            if !matches!(
                session.status,
                SessionStatus::Matched | SessionStatus::Completed
            ) {
                let e = WorkflowError::Precondition(format!(
                    "cannot start rendering while {}",
                    session.status.as_str()
                ));
                session.error = Some(e.to_string());
                return Err(e);
            }
            let job_id = match session.job_id.as_deref() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => {
                    let e =
                        WorkflowError::Precondition("no job to render: upload a photo first".into());
                    session.error = Some(e.to_string());
                    return Err(e);
                }
            };
            if session.candidate_films.is_empty() {
                let e = WorkflowError::Precondition("no candidate films to render".into());
                session.error = Some(e.to_string());
                return Err(e);
            }

            let film_ids: Vec<u32> = session.candidate_films.iter().map(|f| f.film_id).collect();
            let prior = session.status;
            session.status = SessionStatus::Processing;
            session.error = None;
            (prior, ProcessRequest { job_id, film_ids })
        };
        info!(
            "Rendering job {} through {} films",
            request.job_id,
            request.film_ids.len()
        );

        let response = match self.api.process(&request).await {
            Ok(response) => response,
            Err(e) => return self.fail_processing(seq, prior_status, e.into()).await,
        };

        let raw_results = match response.results {
            Some(results) => results,
            None => {
                let e = WorkflowError::MalformedResponse(
                    "process response has no results field".into(),
                );
                return self.fail_processing(seq, prior_status, e).await;
            }
        };

        let summary = partition(
            &request.film_ids,
            raw_results,
            response.success,
            response.failed,
            response.zip_url,
        );
        let advisory = advisory_message(&summary);
        info!(
            "Job {} rendered: {} succeeded, {} failed",
            request.job_id, summary.success_count, summary.failed_count
        );

        let applied = self
            .apply_if_current(seq, |session| {
                session.results = summary.outcomes.clone();
                session.status = SessionStatus::Completed;
                session.error = advisory.clone();
            })
            .await;

        if applied {
            Ok(ProcessOutcome::Completed(summary))
        } else {
            debug!("Discarding superseded render response for job {}", request.job_id);
            Ok(ProcessOutcome::Superseded)
        }
    }

    /// Record a processing failure, restoring the status held before the
    /// batch started. A stale failure is reported as superseded instead.
    async fn fail_processing(
        &self,
        seq: u64,
        prior_status: SessionStatus,
        error: WorkflowError,
    ) -> Result<ProcessOutcome, WorkflowError> {
        warn!("Rendering failed ({}): {}", error.kind(), error);
        let applied = self
            .apply_if_current(seq, |session| {
                session.status = prior_status;
                session.error = Some(error.to_string());
            })
            .await;

        if applied {
            Err(error)
        } else {
            debug!("Discarding superseded render failure");
            Ok(ProcessOutcome::Superseded)
        }
    }
}

/// Check an upload response's shape and lift it into a receipt.
fn validate_upload_response(response: UploadResponse) -> Result<IntakeReceipt, WorkflowError> {
    let job_id = response.job_id.trim();
    if job_id.is_empty() {
        return Err(WorkflowError::MalformedResponse(
            "upload response has no job_id".into(),
        ));
    }

    let image = response
        .images
        .into_iter()
        .next()
        .ok_or_else(|| WorkflowError::MalformedResponse("upload response has no images".into()))?;

    if image.matched_films.is_empty() {
        return Err(WorkflowError::MalformedResponse(
            "upload response contains no matched films".into(),
        ));
    }

    let mut candidate_films = image.matched_films;
    if candidate_films.len() > MAX_CANDIDATE_FILMS {
        debug!(
            "Keeping top {} of {} matched films",
            MAX_CANDIDATE_FILMS,
            candidate_films.len()
        );
        candidate_films.truncate(MAX_CANDIDATE_FILMS);
    }

    Ok(IntakeReceipt {
        job_id: job_id.to_string(),
        candidate_films,
    })
}

/// Partition a batch response into per-film outcomes.
///
/// Results for films that were never requested are dropped. Counts are
/// derived from the kept outcomes; server-reported tallies are only
/// cross-checked.
fn partition(
    requested: &[u32],
    raw: Vec<RenderResultWire>,
    reported_success: Option<u32>,
    reported_failed: Option<u32>,
    zip_url: Option<String>,
) -> BatchSummary {
    let requested_set: HashSet<u32> = requested.iter().copied().collect();

    let mut outcomes = Vec::with_capacity(raw.len());
    for result in raw {
        if !requested_set.contains(&result.film_id) {
            warn!(
                "Dropping result for film {} which was not requested",
                result.film_id
            );
            continue;
        }
        let outcome = match result.status {
            RenderStatus::Success => match result.output_url.filter(|u| !u.is_empty()) {
                Some(output_url) => RenderOutcome::Success {
                    film_id: result.film_id,
                    film_name: result.film_name,
                    output_url,
                    processing_time: result.processing_time,
                },
                None => RenderOutcome::Failed {
                    film_id: result.film_id,
                    film_name: result.film_name,
                    cause: "no artifact location returned".to_string(),
                },
            },
            RenderStatus::Failed | RenderStatus::Unknown => RenderOutcome::Failed {
                film_id: result.film_id,
                film_name: result.film_name,
                cause: result
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "processing failed".to_string()),
            },
        };
        outcomes.push(outcome);
    }

    let success_count = outcomes.iter().filter(|o| o.is_success()).count();
    let failed_count = outcomes.len() - success_count;

    if let Some(reported) = reported_success {
        if reported as usize != success_count {
            warn!(
                "Server reported {} successes but results contain {}",
                reported, success_count
            );
        }
    }
    if let Some(reported) = reported_failed {
        if reported as usize != failed_count {
            warn!(
                "Server reported {} failures but results contain {}",
                reported, failed_count
            );
        }
    }

    BatchSummary {
        outcomes,
        success_count,
        failed_count,
        zip_url,
    }
}

/// Advisory shown when some films failed in an otherwise completed batch.
fn advisory_message(summary: &BatchSummary) -> Option<String> {
    if summary.failed_count == 0 {
        return None;
    }
    Some(format!(
        "{} films failed, {} succeeded",
        summary.failed_count, summary.success_count
    ))
}
