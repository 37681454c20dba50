//! Workflow orchestration: upload, match, render.
//!
//! The orchestrator owns the [`crate::session::Session`] and is the only
//! place it mutates. A workflow runs in three phases:
//!
//! 1. **Intake** - validate the photo locally, then upload it. The server
//!    answers with ranked film candidates.
//! 2. **Rendering** - send all candidates in one batch render request.
//! 3. **Partition** - split the batch response into per-film outcomes;
//!    partial failure completes the session with an advisory message.
//!
//! Re-submission is allowed from any state and supersedes whatever was in
//! flight.

mod intake;
mod types;
mod workflow;

pub use intake::validate as validate_intake;
pub use types::{IntakeOutcome, IntakeReceipt, ProcessOutcome, WorkflowError};
pub use workflow::WorkflowOrchestrator;
