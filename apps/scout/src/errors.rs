use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Startup errors are fatal; everything else is caught at the cycle boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Required environment variable '{0}' is not set")]
    MissingEnv(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidEnv { key: String, message: String },

    #[error("Upstream error ({backend}): {source}")]
    Upstream {
        backend: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Short machine-readable code used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) | AppError::InvalidEnv { .. } => "CONFIG_ERROR",
            AppError::Upstream { .. } => "UPSTREAM_ERROR",
            AppError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }
}
