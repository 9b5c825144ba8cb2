//! Error types for capability gathering and feature-level resolution

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced by the capability registry and the material library.
///
/// Probe and negotiation failures never show up here; those are absorbed into
/// conservative capability values. Only authoring mistakes are reported.
#[derive(Error, Debug)]
pub enum CapsError {
    #[error("Failed to read capability config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse capability config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },
    #[error("Feature level '{0}' is not registered")]
    UnknownFeatureLevel(String),
    #[error("Fallback from '{from}' to '{to}' would create a cycle")]
    FallbackCycle { from: String, to: String },
    #[error("Unknown material id {0}")]
    UnknownMaterial(usize),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type CapsResult<T> = Result<T, CapsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CapsError::UnknownFeatureLevel("ultra".to_string());
        assert_eq!(err.to_string(), "Feature level 'ultra' is not registered");

        let err = CapsError::FallbackCycle {
            from: "a".into(),
            to: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "Fallback from 'a' to 'b' would create a cycle"
        );
    }

    #[test]
    fn test_backend_error_converts() {
        let err: CapsError = BackendError::DeviceLost.into();
        assert_eq!(err.to_string(), "Device lost");
    }
}
