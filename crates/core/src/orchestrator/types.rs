use thiserror::Error;

use crate::api::{ApiError, FilmCandidate};
use crate::session::BatchSummary;

/// Errors surfaced by the workflow orchestrator.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The submitted file was rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The session is not in a state that permits the operation; no request
    /// was sent.
    #[error("{0}")]
    Precondition(String),

    /// The request never reached the server.
    #[error("network unreachable: {0}")]
    Transport(String),

    /// The server rejected the request.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The server's response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl WorkflowError {
    /// Stable error-class label, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::Precondition(_) => "precondition",
            WorkflowError::Transport(_) => "transport",
            WorkflowError::Server { .. } => "server",
            WorkflowError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<ApiError> for WorkflowError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Transport(message) => WorkflowError::Transport(message),
            ApiError::Server { status, message } => WorkflowError::Server { status, message },
            ApiError::MalformedResponse(message) => WorkflowError::MalformedResponse(message),
        }
    }
}

/// What an accepted upload produced.
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    pub job_id: String,
    /// Ranked candidates, best first.
    pub candidate_films: Vec<FilmCandidate>,
}

/// Result of a submit that completed without error.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    Accepted(IntakeReceipt),
    /// A newer submit started while this one was in flight; its response was
    /// discarded and the session untouched.
    Superseded,
}

/// Result of a render batch that completed without error.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Completed(BatchSummary),
    /// A newer submit started while the batch was in flight; its response
    /// was discarded and the session untouched.
    Superseded,
}

impl ProcessOutcome {
    /// The summary of an applied batch, `None` if it was superseded.
    pub fn into_summary(self) -> Option<BatchSummary> {
        match self {
            ProcessOutcome::Completed(summary) => Some(summary),
            ProcessOutcome::Superseded => None,
        }
    }
}
