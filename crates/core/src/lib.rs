//! Core library for filmrecipe, a client for the film lab rendering service.
//!
//! A photograph is uploaded for EXIF analysis, the server answers with
//! ranked film-stock candidates, and the photo is then batch-rendered
//! through those films. The pieces:
//!
//! - [`config`] - file and environment configuration
//! - [`api`] - wire types and the HTTP client behind the [`api::FilmLabApi`]
//!   trait
//! - [`session`] - the workflow state machine's observable state
//! - [`orchestrator`] - drives a session through upload, match, and render
//! - [`testing`] - mock backend and fixtures

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod session;
pub mod testing;

pub use api::{ApiError, FilmLabApi, FilmLabClient, ImagePayload};
pub use config::{load_config, load_config_or_default, validate_config, Config};
pub use orchestrator::{IntakeOutcome, ProcessOutcome, WorkflowError, WorkflowOrchestrator};
pub use session::{BatchSummary, RenderOutcome, Session, SessionStatus};
