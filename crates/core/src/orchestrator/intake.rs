//! Pre-flight checks on a photo before it is uploaded.

use crate::api::ImagePayload;
use crate::config::IntakeConfig;

use super::types::WorkflowError;

const MIB: u64 = 1024 * 1024;

/// Validate a payload against the intake limits.
///
/// Runs entirely locally; a rejection here means no request was sent.
pub fn validate(payload: &ImagePayload, config: &IntakeConfig) -> Result<(), WorkflowError> {
    if payload.bytes.is_empty() {
        return Err(WorkflowError::Validation(
            "no image file selected".to_string(),
        ));
    }

    if payload.size_bytes() > config.max_file_size_bytes {
        return Err(WorkflowError::Validation(format!(
            "{} is too large: {:.1} MiB exceeds the {:.0} MiB limit",
            payload.file_name,
            payload.size_bytes() as f64 / MIB as f64,
            config.max_file_size_bytes as f64 / MIB as f64,
        )));
    }

    match payload.extension() {
        Some(ext)
            if config
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&ext)) =>
        {
            Ok(())
        }
        Some(ext) => Err(WorkflowError::Validation(format!(
            "unsupported file type .{}: accepted types are {}",
            ext,
            config.allowed_extensions.join(", ")
        ))),
        None => Err(WorkflowError::Validation(format!(
            "{} has no file extension: accepted types are {}",
            payload.file_name,
            config.allowed_extensions.join(", ")
        ))),
    }
}
