//! Film lab API boundary.
//!
//! [`FilmLabApi`] is the seam between the workflow orchestrator and the
//! remote service: [`FilmLabClient`] is the HTTP implementation, and
//! `testing::MockFilmLabApi` stands in for it in tests. Wire types mirror
//! the server's JSON bodies; lenient fields are `Option`/defaulted so the
//! orchestrator can report shape problems precisely.

mod client;
mod types;

pub use client::FilmLabClient;
pub use types::{
    ApiError, FilmCandidate, FilmDetail, FilmFilter, FilmLabApi, FilmListing, FilmRecord,
    FilmType, ImagePayload, JobInfo, ProcessRequest, ProcessResponse, RenderResultWire,
    RenderStatus, UploadResponse, UploadedImage,
};
