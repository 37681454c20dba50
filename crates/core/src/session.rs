//! Session state for one photo-to-renders workflow.
//!
//! A session moves through a small state machine:
//!
//! ```text
//! Idle -> Uploading -> Matched -> Processing -> Completed
//! ```
//!
//! A failed network phase returns the session to the stable status it held
//! before that phase started. `error` is an advisory message orthogonal to
//! the status: a completed batch with some failed films is still
//! `Completed`, with the failures summarized in `error`.

use serde::{Deserialize, Serialize};

use crate::api::FilmCandidate;

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No upload accepted yet.
    Idle,
    /// Upload request in flight.
    Uploading,
    /// Candidates received; ready to render.
    Matched,
    /// Render batch in flight.
    Processing,
    /// Render batch finished (possibly with per-film failures).
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Uploading => "uploading",
            SessionStatus::Matched => "matched",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Outcome of rendering one film, after partitioning the batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    Success {
        film_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        film_name: Option<String>,
        /// Artifact location, relative to the server origin unless absolute.
        output_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        processing_time: Option<f64>,
    },
    Failed {
        film_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        film_name: Option<String>,
        cause: String,
    },
}

impl RenderOutcome {
    pub fn film_id(&self) -> u32 {
        match self {
            RenderOutcome::Success { film_id, .. } => *film_id,
            RenderOutcome::Failed { film_id, .. } => *film_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RenderOutcome::Success { .. })
    }

    pub fn output_url(&self) -> Option<&str> {
        match self {
            RenderOutcome::Success { output_url, .. } => Some(output_url),
            RenderOutcome::Failed { .. } => None,
        }
    }
}

/// Partitioned result of one render batch.
///
/// Counts are derived from `outcomes`, never taken from the server's
/// reported tallies, so they always sum to `outcomes.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<RenderOutcome>,
    pub success_count: usize,
    pub failed_count: usize,
    /// Location of the all-films ZIP bundle, when the server produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_url: Option<String>,
}

impl BatchSummary {
    pub fn successes(&self) -> impl Iterator<Item = &RenderOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RenderOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Snapshot of one workflow session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Job handle from the last accepted upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Ranked film candidates, best first.
    #[serde(default)]
    pub candidate_films: Vec<FilmCandidate>,
    /// Outcomes of the most recent render batch.
    #[serde(default)]
    pub results: Vec<RenderOutcome>,
    pub status: SessionStatus,
    /// Advisory message; does not gate transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            job_id: None,
            candidate_films: Vec::new(),
            results: Vec::new(),
            status: SessionStatus::Idle,
            error: None,
        }
    }
}
