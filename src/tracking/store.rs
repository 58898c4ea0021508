//! Tracking store abstraction shared by the local and remote backends

use serde::{Deserialize, Serialize};

use super::config::{StoreLocation, TrackingConfig};
use super::error::{TrackingError, TrackingResult};
use super::file_store::FileStore;
use super::rest_store::RestStore;

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
    Killed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Finished => write!(f, "FINISHED"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Killed => write!(f, "KILLED"),
        }
    }
}

/// Identity of a run as returned by the store when it is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    pub run_name: String,
    /// Root under which the run's artifacts are stored
    pub artifact_uri: String,
    /// Milliseconds since the Unix epoch
    pub start_time: i64,
}

/// A registered model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    /// Artifact location the version was created from
    pub source: String,
    pub run_id: String,
    pub creation_timestamp: i64,
}

/// Operations an experiment tracker backend provides.
///
/// Calls are blocking; failures are returned as-is without retries.
pub trait TrackingStore {
    /// Human-readable location, for console output
    fn describe(&self) -> String;

    /// Id of the experiment called `name`, creating it when absent
    fn get_or_create_experiment(&self, name: &str) -> TrackingResult<String>;

    /// Open a new run in `RUNNING` state
    fn create_run(&self, experiment_id: &str, run_name: &str, start_time: i64) -> TrackingResult<RunInfo>;

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> TrackingResult<()>;

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, timestamp: i64, step: i64) -> TrackingResult<()>;

    /// Store `contents` as `<artifact_path>/<file_name>` under the run's artifact root.
    ///
    /// Returns the URI of the `artifact_path` directory.
    fn log_artifact(
        &self,
        run: &RunInfo,
        artifact_path: &str,
        file_name: &str,
        contents: &[u8],
    ) -> TrackingResult<String>;

    /// Move the run to a terminal status
    fn update_run(&self, run: &RunInfo, status: RunStatus, end_time: i64) -> TrackingResult<()>;

    /// Create the next version of registered model `name` from `source`
    fn register_model(&self, name: &str, source: &str, run_id: &str) -> TrackingResult<ModelVersion>;
}

/// Build the store the configuration points at
pub fn open_store(config: &TrackingConfig) -> TrackingResult<Box<dyn TrackingStore>> {
    match config.location()? {
        StoreLocation::Local(root) => Ok(Box::new(FileStore::new(root)?)),
        StoreLocation::Remote(base_url) => Ok(Box::new(RestStore::new(base_url, config)?)),
    }
}

/// Check that an artifact path is relative and free of `..`/empty segments
pub(crate) fn validate_relative_path(path: &str) -> TrackingResult<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        return Err(TrackingError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_like_mlflow() {
        assert_eq!(serde_json::to_string(&RunStatus::Finished).unwrap(), "\"FINISHED\"");
        assert_eq!(RunStatus::Failed.to_string(), "FAILED");
        let parsed: RunStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(parsed, RunStatus::Running);
    }

    #[test]
    fn test_relative_path_validation() {
        assert!(validate_relative_path("model").is_ok());
        assert!(validate_relative_path("model/extra").is_ok());
        assert!(validate_relative_path("").is_err());
        assert!(validate_relative_path("/etc").is_err());
        assert!(validate_relative_path("../escape").is_err());
        assert!(validate_relative_path("a//b").is_err());
    }
}
