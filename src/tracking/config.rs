//! Tracking configuration, read from the environment

use std::path::PathBuf;

use super::error::{TrackingError, TrackingResult};

pub const TRACKING_URI_ENV: &str = "MLFLOW_TRACKING_URI";
pub const EXPERIMENT_NAME_ENV: &str = "MLFLOW_EXPERIMENT_NAME";
pub const TRACKING_TOKEN_ENV: &str = "MLFLOW_TRACKING_TOKEN";
pub const TRACKING_USERNAME_ENV: &str = "MLFLOW_TRACKING_USERNAME";
pub const TRACKING_PASSWORD_ENV: &str = "MLFLOW_TRACKING_PASSWORD";

/// Local store used when no tracking URI is configured
pub const DEFAULT_TRACKING_URI: &str = "./mlruns";

pub const DEFAULT_EXPERIMENT_NAME: &str = "churn-prediction";

/// Where runs are recorded and how to authenticate
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    pub tracking_uri: String,
    pub experiment_name: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Resolved store location
#[derive(Debug, Clone, PartialEq)]
pub enum StoreLocation {
    /// Directory on the local filesystem
    Local(PathBuf),
    /// Base URL of an MLflow tracking server, without trailing slash
    Remote(String),
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracking_uri: DEFAULT_TRACKING_URI.to_string(),
            experiment_name: DEFAULT_EXPERIMENT_NAME.to_string(),
            token: None,
            username: None,
            password: None,
        }
    }
}

impl TrackingConfig {
    /// Read the MLflow environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            tracking_uri: get(TRACKING_URI_ENV).unwrap_or(defaults.tracking_uri),
            experiment_name: get(EXPERIMENT_NAME_ENV).unwrap_or(defaults.experiment_name),
            token: get(TRACKING_TOKEN_ENV),
            username: get(TRACKING_USERNAME_ENV),
            password: get(TRACKING_PASSWORD_ENV),
        }
    }

    /// Decide which store the tracking URI points at
    pub fn location(&self) -> TrackingResult<StoreLocation> {
        let uri = self.tracking_uri.trim();

        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(StoreLocation::Remote(uri.trim_end_matches('/').to_string()));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(StoreLocation::Local(PathBuf::from(path)));
        }
        if let Some(path) = uri.strip_prefix("file:") {
            return Ok(StoreLocation::Local(PathBuf::from(path)));
        }
        if uri.contains("://") {
            return Err(TrackingError::UnsupportedUri(uri.to_string()));
        }

        Ok(StoreLocation::Local(PathBuf::from(uri)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> TrackingConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrackingConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = config_from(&[]);
        assert_eq!(cfg, TrackingConfig::default());
        assert_eq!(
            cfg.location().unwrap(),
            StoreLocation::Local(PathBuf::from("./mlruns"))
        );
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let cfg = config_from(&[(TRACKING_URI_ENV, "  "), (TRACKING_TOKEN_ENV, "")]);
        assert_eq!(cfg.tracking_uri, DEFAULT_TRACKING_URI);
        assert!(cfg.token.is_none());
    }

    #[test]
    fn test_remote_uri_trailing_slash_trimmed() {
        let cfg = config_from(&[
            (TRACKING_URI_ENV, "http://localhost:5000/"),
            (EXPERIMENT_NAME_ENV, "churn-nightly"),
            (TRACKING_TOKEN_ENV, "secret"),
        ]);
        assert_eq!(
            cfg.location().unwrap(),
            StoreLocation::Remote("http://localhost:5000".to_string())
        );
        assert_eq!(cfg.experiment_name, "churn-nightly");
        assert_eq!(cfg.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_file_uris() {
        let cfg = config_from(&[(TRACKING_URI_ENV, "file:///var/mlruns")]);
        assert_eq!(
            cfg.location().unwrap(),
            StoreLocation::Local(PathBuf::from("/var/mlruns"))
        );

        let cfg = config_from(&[(TRACKING_URI_ENV, "file:relative/runs")]);
        assert_eq!(
            cfg.location().unwrap(),
            StoreLocation::Local(PathBuf::from("relative/runs"))
        );
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let cfg = config_from(&[(TRACKING_URI_ENV, "databricks://profile")]);
        assert!(matches!(cfg.location(), Err(TrackingError::UnsupportedUri(_))));
    }
}
