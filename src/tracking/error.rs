//! Error types for the experiment tracking client

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to a tracking store
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The tracking URI scheme is not handled by any store
    #[error("Unsupported tracking URI '{0}'. Use a local path, a file: URI, or an http(s) server URL")]
    UnsupportedUri(String),

    /// Reading or writing the local store failed
    #[error("Tracking store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be (de)serialized
    #[error("Malformed tracking record: {0}")]
    Json(#[from] serde_json::Error),

    /// The request never produced a response (connection refused, DNS, TLS...)
    #[error("Tracking server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status
    #[error("Tracking server returned {status} ({error_code}): {message}")]
    Api {
        status: u16,
        error_code: String,
        message: String,
    },

    /// A run, experiment or model referenced by id/name does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Only runs in RUNNING state accept new params and metrics
    #[error("Run {run_id} is {status}; it no longer accepts logging")]
    RunNotActive { run_id: String, status: String },

    /// Params are write-once per run
    #[error("Param '{key}' was already logged with value '{existing}'; cannot change it to '{new}'")]
    ParamConflict {
        key: String,
        existing: String,
        new: String,
    },

    /// Names and artifact paths must be plain relative segments
    #[error("Invalid name or artifact path '{0}'")]
    InvalidPath(String),
}

impl TrackingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackingError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for server errors carrying the given MLflow error code
    pub fn has_error_code(&self, code: &str) -> bool {
        matches!(self, TrackingError::Api { error_code, .. } if error_code == code)
    }
}

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;
