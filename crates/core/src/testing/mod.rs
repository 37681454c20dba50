//! Test doubles and fixtures.
//!
//! Public so integration tests and downstream crates can drive the
//! orchestrator without a running film lab server.

mod mock_api;

pub use mock_api::{MockFilmLabApi, RecordedUpload};

/// Canned wire values for tests.
pub mod fixtures {
    use crate::api::{
        FilmCandidate, FilmRecord, FilmType, ImagePayload, ProcessResponse, RenderResultWire,
        RenderStatus, UploadResponse, UploadedImage,
    };

    pub fn film_candidate(film_id: u32, film_name: &str) -> FilmCandidate {
        FilmCandidate {
            film_id,
            film_name: film_name.to_string(),
            manufacturer: "Kodak".to_string(),
            tier: "mvp".to_string(),
            score: 90.0 - film_id as f64,
            reason: "ISO 400, f/2.8 - daylight portrait".to_string(),
            iso_base: 400,
            film_type: FilmType::Color,
        }
    }

    /// `n` candidates ranked best-first, with ids 1..=n.
    pub fn candidate_list(n: u32) -> Vec<FilmCandidate> {
        (1..=n)
            .map(|id| film_candidate(id, &format!("Film {}", id)))
            .collect()
    }

    pub fn upload_response(job_id: &str, films: Vec<FilmCandidate>) -> UploadResponse {
        UploadResponse {
            job_id: job_id.to_string(),
            count: Some(1),
            images: vec![UploadedImage {
                filename: Some(format!("{}_photo.jpg", job_id)),
                original_filename: Some("photo.jpg".to_string()),
                exif: Some(serde_json::json!({"iso": 400, "aperture": "f/2.8"})),
                matched_films: films,
            }],
        }
    }

    pub fn render_success_wire(film_id: u32, output_url: &str) -> RenderResultWire {
        RenderResultWire {
            film_id,
            film_name: Some(format!("Film {}", film_id)),
            status: RenderStatus::Success,
            output_url: Some(output_url.to_string()),
            error: None,
            processing_time: Some(1.5),
        }
    }

    pub fn render_failure_wire(film_id: u32, cause: &str) -> RenderResultWire {
        RenderResultWire {
            film_id,
            film_name: Some(format!("Film {}", film_id)),
            status: RenderStatus::Failed,
            output_url: None,
            error: Some(cause.to_string()),
            processing_time: None,
        }
    }

    /// Process response with tallies derived from `results`, the way a
    /// well-behaved server reports them.
    pub fn process_response(results: Vec<RenderResultWire>) -> ProcessResponse {
        let success = results
            .iter()
            .filter(|r| r.status == RenderStatus::Success)
            .count() as u32;
        let failed = results.len() as u32 - success;
        ProcessResponse {
            job_id: None,
            status: Some("completed".to_string()),
            total: Some(results.len() as u32),
            success: Some(success),
            failed: Some(failed),
            results: Some(results),
            zip_url: Some("/api/download/abc123/all_films.zip".to_string()),
            processing_time: Some(4.2),
            warning: None,
        }
    }

    pub fn film_record(id: u32, name: &str, tier: &str, film_type: FilmType) -> FilmRecord {
        FilmRecord {
            id,
            name: name.to_string(),
            manufacturer: "Kodak".to_string(),
            film_type,
            iso_base: 400,
            description: None,
            tier: tier.to_string(),
            recipes: Vec::new(),
        }
    }

    /// A JPEG payload of `kb` kibibytes of filler.
    pub fn jpeg_payload(kb: usize) -> ImagePayload {
        ImagePayload::new("photo.jpg", vec![0xAB; kb * 1024])
    }
}
