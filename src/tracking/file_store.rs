//! Local filesystem tracking store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<experiment_id>/experiment.json
//! <root>/<experiment_id>/<run_id>/run.json
//! <root>/<experiment_id>/<run_id>/artifacts/<artifact_path>/<file>
//! <root>/models/<name>/registered_model.json
//! <root>/models/<name>/version-<n>.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{TrackingError, TrackingResult};
use super::store::{now_millis, validate_relative_path, ModelVersion, RunInfo, RunStatus, TrackingStore};

const EXPERIMENT_FILE: &str = "experiment.json";
const RUN_FILE: &str = "run.json";
const MODELS_DIR: &str = "models";
const REGISTERED_MODEL_FILE: &str = "registered_model.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExperimentMeta {
    experiment_id: String,
    name: String,
    creation_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegisteredModelMeta {
    name: String,
    creation_timestamp: i64,
}

/// One logged metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub key: String,
    pub value: f64,
    pub timestamp: i64,
    pub step: i64,
}

/// Everything recorded for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub info: RunInfo,
    pub status: RunStatus,
    pub end_time: Option<i64>,
    pub params: BTreeMap<String, String>,
    pub metrics: Vec<MetricEntry>,
}

impl RunRecord {
    /// Most recently logged value of a metric
    pub fn latest_metric(&self, key: &str) -> Option<f64> {
        self.metrics.iter().rev().find(|m| m.key == key).map(|m| m.value)
    }
}

/// Tracking store backed by JSON files in a local directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> TrackingResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TrackingError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Load the record of a run
    pub fn read_run(&self, experiment_id: &str, run_id: &str) -> TrackingResult<RunRecord> {
        let path = self.run_dir(experiment_id, run_id).join(RUN_FILE);
        if !path.exists() {
            return Err(TrackingError::NotFound(format!("run {}", run_id)));
        }
        read_json(&path)
    }

    /// All versions of a registered model, oldest first
    pub fn list_model_versions(&self, name: &str) -> TrackingResult<Vec<ModelVersion>> {
        validate_name(name)?;
        let dir = self.model_dir(name);
        if !dir.exists() {
            return Err(TrackingError::NotFound(format!("registered model {}", name)));
        }

        let mut versions: Vec<ModelVersion> = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| TrackingError::io(&dir, e))? {
            let entry = entry.map_err(|e| TrackingError::io(&dir, e))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with("version-") && file_name.ends_with(".json") {
                versions.push(read_json(&entry.path())?);
            }
        }

        versions.sort_by_key(|v| v.version.parse::<u64>().unwrap_or(0));
        Ok(versions)
    }

    fn experiment_dir(&self, experiment_id: &str) -> PathBuf {
        self.root.join(experiment_id)
    }

    fn run_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.experiment_dir(experiment_id).join(run_id)
    }

    fn model_dir(&self, name: &str) -> PathBuf {
        self.root.join(MODELS_DIR).join(name)
    }

    fn list_experiments(&self) -> TrackingResult<Vec<ExperimentMeta>> {
        let mut experiments = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| TrackingError::io(&self.root, e))? {
            let entry = entry.map_err(|e| TrackingError::io(&self.root, e))?;
            let meta_path = entry.path().join(EXPERIMENT_FILE);
            if meta_path.is_file() {
                experiments.push(read_json(&meta_path)?);
            }
        }
        Ok(experiments)
    }

    /// Apply `update` to a RUNNING run's record and persist it
    fn update_active<F>(&self, run: &RunInfo, update: F) -> TrackingResult<()>
    where
        F: FnOnce(&mut RunRecord) -> TrackingResult<()>,
    {
        let mut record = self.read_run(&run.experiment_id, &run.run_id)?;
        if record.status != RunStatus::Running {
            return Err(TrackingError::RunNotActive {
                run_id: run.run_id.clone(),
                status: record.status.to_string(),
            });
        }
        update(&mut record)?;
        self.write_run(&record)
    }

    fn write_run(&self, record: &RunRecord) -> TrackingResult<()> {
        let path = self
            .run_dir(&record.info.experiment_id, &record.info.run_id)
            .join(RUN_FILE);
        write_json(&path, record)
    }
}

impl TrackingStore for FileStore {
    fn describe(&self) -> String {
        format!("file store at {}", self.root.display())
    }

    fn get_or_create_experiment(&self, name: &str) -> TrackingResult<String> {
        let experiments = self.list_experiments()?;
        if let Some(existing) = experiments.iter().find(|e| e.name == name) {
            return Ok(existing.experiment_id.clone());
        }

        let next_id = experiments
            .iter()
            .filter_map(|e| e.experiment_id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);

        let meta = ExperimentMeta {
            experiment_id: next_id.to_string(),
            name: name.to_string(),
            creation_time: now_millis(),
        };
        let dir = self.experiment_dir(&meta.experiment_id);
        fs::create_dir_all(&dir).map_err(|e| TrackingError::io(&dir, e))?;
        write_json(&dir.join(EXPERIMENT_FILE), &meta)?;

        Ok(meta.experiment_id)
    }

    fn create_run(&self, experiment_id: &str, run_name: &str, start_time: i64) -> TrackingResult<RunInfo> {
        let exp_dir = self.experiment_dir(experiment_id);
        if !exp_dir.join(EXPERIMENT_FILE).is_file() {
            return Err(TrackingError::NotFound(format!("experiment {}", experiment_id)));
        }

        let run_id = format!("{:032x}", rand::random::<u128>());
        let run_dir = self.run_dir(experiment_id, &run_id);
        let artifacts = run_dir.join("artifacts");
        fs::create_dir_all(&artifacts).map_err(|e| TrackingError::io(&artifacts, e))?;

        let info = RunInfo {
            run_id,
            experiment_id: experiment_id.to_string(),
            run_name: run_name.to_string(),
            artifact_uri: artifacts.display().to_string(),
            start_time,
        };

        self.write_run(&RunRecord {
            info: info.clone(),
            status: RunStatus::Running,
            end_time: None,
            params: BTreeMap::new(),
            metrics: Vec::new(),
        })?;

        Ok(info)
    }

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> TrackingResult<()> {
        self.update_active(run, |record| {
            if let Some(existing) = record.params.get(key) {
                if existing != value {
                    return Err(TrackingError::ParamConflict {
                        key: key.to_string(),
                        existing: existing.clone(),
                        new: value.to_string(),
                    });
                }
            }
            record.params.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, timestamp: i64, step: i64) -> TrackingResult<()> {
        self.update_active(run, |record| {
            record.metrics.push(MetricEntry {
                key: key.to_string(),
                value,
                timestamp,
                step,
            });
            Ok(())
        })
    }

    fn log_artifact(
        &self,
        run: &RunInfo,
        artifact_path: &str,
        file_name: &str,
        contents: &[u8],
    ) -> TrackingResult<String> {
        validate_relative_path(artifact_path)?;
        validate_name(file_name)?;

        let dir = Path::new(&run.artifact_uri).join(artifact_path);
        fs::create_dir_all(&dir).map_err(|e| TrackingError::io(&dir, e))?;
        let path = dir.join(file_name);
        fs::write(&path, contents).map_err(|e| TrackingError::io(&path, e))?;

        Ok(dir.display().to_string())
    }

    fn update_run(&self, run: &RunInfo, status: RunStatus, end_time: i64) -> TrackingResult<()> {
        let mut record = self.read_run(&run.experiment_id, &run.run_id)?;
        record.status = status;
        record.end_time = Some(end_time);
        self.write_run(&record)
    }

    fn register_model(&self, name: &str, source: &str, run_id: &str) -> TrackingResult<ModelVersion> {
        validate_name(name)?;
        let dir = self.model_dir(name);
        fs::create_dir_all(&dir).map_err(|e| TrackingError::io(&dir, e))?;

        let meta_path = dir.join(REGISTERED_MODEL_FILE);
        if !meta_path.exists() {
            write_json(
                &meta_path,
                &RegisteredModelMeta {
                    name: name.to_string(),
                    creation_timestamp: now_millis(),
                },
            )?;
        }

        let next = self
            .list_model_versions(name)?
            .last()
            .and_then(|v| v.version.parse::<u64>().ok())
            .map_or(1, |latest| latest + 1);

        let version = ModelVersion {
            name: name.to_string(),
            version: next.to_string(),
            source: source.to_string(),
            run_id: run_id.to_string(),
            creation_timestamp: now_millis(),
        };
        write_json(&dir.join(format!("version-{}.json", next)), &version)?;

        Ok(version)
    }
}

/// A single path segment usable as a directory or file name
fn validate_name(name: &str) -> TrackingResult<()> {
    validate_relative_path(name)?;
    if name.contains('/') {
        return Err(TrackingError::InvalidPath(name.to_string()));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> TrackingResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| TrackingError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> TrackingResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| TrackingError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("mlruns")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_experiment_is_reused_by_name() {
        let (_dir, store) = store();
        let a = store.get_or_create_experiment("churn-prediction").unwrap();
        let b = store.get_or_create_experiment("churn-prediction").unwrap();
        let c = store.get_or_create_experiment("other").unwrap();
        assert_eq!(a, "1");
        assert_eq!(a, b);
        assert_eq!(c, "2");
    }

    #[test]
    fn test_run_lifecycle_is_recorded() {
        let (_dir, store) = store();
        let exp = store.get_or_create_experiment("e").unwrap();
        let run = store.create_run(&exp, "run", 1_000).unwrap();
        assert_eq!(run.run_id.len(), 32);

        store.log_param(&run, "model_type", "LogisticRegression").unwrap();
        store.log_metric(&run, "val_f1_score", 0.61, 1_001, 0).unwrap();
        store.update_run(&run, RunStatus::Finished, 1_002).unwrap();

        let record = store.read_run(&exp, &run.run_id).unwrap();
        assert_eq!(record.status, RunStatus::Finished);
        assert_eq!(record.end_time, Some(1_002));
        assert_eq!(record.params["model_type"], "LogisticRegression");
        assert_eq!(record.latest_metric("val_f1_score"), Some(0.61));
    }

    #[test]
    fn test_finished_run_rejects_logging() {
        let (_dir, store) = store();
        let exp = store.get_or_create_experiment("e").unwrap();
        let run = store.create_run(&exp, "run", 0).unwrap();
        store.update_run(&run, RunStatus::Finished, 1).unwrap();

        let err = store.log_metric(&run, "m", 1.0, 2, 0).unwrap_err();
        assert!(matches!(err, TrackingError::RunNotActive { .. }));
    }

    #[test]
    fn test_param_is_write_once() {
        let (_dir, store) = store();
        let exp = store.get_or_create_experiment("e").unwrap();
        let run = store.create_run(&exp, "run", 0).unwrap();

        store.log_param(&run, "k", "v").unwrap();
        store.log_param(&run, "k", "v").unwrap();
        assert!(matches!(
            store.log_param(&run, "k", "other"),
            Err(TrackingError::ParamConflict { .. })
        ));
    }

    #[test]
    fn test_create_run_in_unknown_experiment() {
        let (_dir, store) = store();
        assert!(matches!(
            store.create_run("99", "run", 0),
            Err(TrackingError::NotFound(_))
        ));
    }

    #[test]
    fn test_artifacts_written_under_run() {
        let (_dir, store) = store();
        let exp = store.get_or_create_experiment("e").unwrap();
        let run = store.create_run(&exp, "run", 0).unwrap();

        let uri = store.log_artifact(&run, "model", "model.json", b"{}").unwrap();
        assert!(Path::new(&uri).join("model.json").is_file());
        assert!(store.log_artifact(&run, "../escape", "x", b"").is_err());
        assert!(store.log_artifact(&run, "model", "a/b", b"").is_err());
    }

    #[test]
    fn test_registry_versions_increment() {
        let (_dir, store) = store();
        let v1 = store.register_model("telco-churn-model", "/a", "r1").unwrap();
        let v2 = store.register_model("telco-churn-model", "/b", "r2").unwrap();
        assert_eq!(v1.version, "1");
        assert_eq!(v2.version, "2");

        let versions = store.list_model_versions("telco-churn-model").unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].run_id, "r2");
        assert!(store.register_model("bad/name", "/c", "r3").is_err());
    }
}
