use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SpyError, Stage};
use crate::models::CandidateProfile;

// Reads the text of a CV. PDFs go through `pdf-extract`; anything else is
// read as UTF-8 text.
pub fn extract_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| {
            SpyError::acquisition(
                Stage::CvAnalysis,
                format!("Failed to extract text from {}: {}", path.display(), e),
            )
        })?
    } else {
        fs::read_to_string(path).map_err(|e| {
            let message = if e.kind() == ErrorKind::InvalidData {
                format!("Unsupported format: {} is neither PDF nor text", path.display())
            } else {
                format!("Failed to read {}: {}", path.display(), e)
            };
            SpyError::acquisition(Stage::CvAnalysis, message)
        })?
    };

    if text.trim().is_empty() {
        return Err(SpyError::acquisition(
            Stage::CvAnalysis,
            format!("No text found in {}", path.display()),
        ));
    }

    debug!(path = %path.display(), chars = text.len(), "extracted CV text");
    Ok(text)
}

// Loads a previously saved candidate profile (JSON).
pub fn load_profile(path: &Path) -> Result<CandidateProfile> {
    let raw = fs::read_to_string(path).map_err(|e| {
        SpyError::acquisition(
            Stage::CvAnalysis,
            format!("Failed to read profile {}: {}", path.display(), e),
        )
    })?;
    let profile: CandidateProfile = serde_json::from_str(&raw).map_err(|e| {
        SpyError::malformed(
            Stage::CvAnalysis,
            format!("Invalid profile JSON in {}: {}", path.display(), e),
        )
    })?;
    Ok(profile.normalized())
}
