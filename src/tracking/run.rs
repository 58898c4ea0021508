//! Run scope: a started run that is always closed, on success or on error

use anyhow::{Context, Result};
use serde::Serialize;

use super::config::TrackingConfig;
use super::store::{now_millis, open_store, ModelVersion, RunInfo, RunStatus, TrackingStore};

const MODEL_FILE: &str = "model.json";
const MODEL_DESCRIPTOR_FILE: &str = "MLmodel";

/// Experiment tracker bound to one experiment
pub struct Tracker {
    store: Box<dyn TrackingStore>,
    experiment_id: String,
    experiment_name: String,
}

impl Tracker {
    /// Connect to the configured store and resolve the experiment
    pub fn open(config: &TrackingConfig) -> Result<Self> {
        let store = open_store(config)
            .with_context(|| format!("Failed to open tracking store '{}'", config.tracking_uri))?;
        Self::with_store(store, &config.experiment_name)
    }

    pub fn with_store(store: Box<dyn TrackingStore>, experiment_name: &str) -> Result<Self> {
        let experiment_id = store
            .get_or_create_experiment(experiment_name)
            .with_context(|| format!("Failed to resolve experiment '{}'", experiment_name))?;

        Ok(Self {
            store,
            experiment_id,
            experiment_name: experiment_name.to_string(),
        })
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    pub fn describe(&self) -> String {
        self.store.describe()
    }

    /// Start a run. It stays RUNNING until `finish` is called; if the
    /// returned guard is dropped first the run is marked FAILED.
    pub fn start_run(&self, run_name: &str) -> Result<ActiveRun<'_>> {
        let info = self
            .store
            .create_run(&self.experiment_id, run_name, now_millis())
            .context("Failed to start tracking run")?;

        Ok(ActiveRun {
            store: self.store.as_ref(),
            info,
            closed: false,
        })
    }
}

/// An open run
pub struct ActiveRun<'a> {
    store: &'a dyn TrackingStore,
    info: RunInfo,
    closed: bool,
}

impl ActiveRun<'_> {
    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    pub fn log_param(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .log_param(&self.info, key, value)
            .with_context(|| format!("Failed to log param '{}'", key))
    }

    pub fn log_metric(&self, key: &str, value: f64) -> Result<()> {
        self.store
            .log_metric(&self.info, key, value, now_millis(), 0)
            .with_context(|| format!("Failed to log metric '{}'", key))
    }

    /// Store `model` as a JSON artifact under `artifact_path` and register
    /// it as the next version of `registered_name`
    pub fn log_model<M: Serialize>(
        &self,
        artifact_path: &str,
        model: &M,
        registered_name: &str,
    ) -> Result<ModelVersion> {
        let model_json = serde_json::to_string_pretty(model).context("Failed to serialize model")?;

        let source = self
            .store
            .log_artifact(&self.info, artifact_path, MODEL_FILE, model_json.as_bytes())
            .context("Failed to upload model artifact")?;

        let descriptor = model_descriptor(&self.info, artifact_path);
        self.store
            .log_artifact(&self.info, artifact_path, MODEL_DESCRIPTOR_FILE, descriptor.as_bytes())
            .context("Failed to upload model descriptor")?;

        self.store
            .register_model(registered_name, &source, &self.info.run_id)
            .with_context(|| format!("Failed to register model '{}'", registered_name))
    }

    /// Close the run as FINISHED. If the store rejects the update the
    /// guard still falls back to marking the run FAILED on drop.
    pub fn finish(mut self) -> Result<()> {
        self.store
            .update_run(&self.info, RunStatus::Finished, now_millis())
            .context("Failed to finalize tracking run")?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self
            .store
            .update_run(&self.info, RunStatus::Failed, now_millis())
        {
            eprintln!("Failed to mark run {} as FAILED: {}", self.info.run_id, e);
        }
    }
}

/// Minimal MLmodel descriptor stored next to the model file
fn model_descriptor(info: &RunInfo, artifact_path: &str) -> String {
    let created = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f");

    format!(
        "artifact_path: {}\nflavors:\n  churnflow:\n    data: {}\n    model_type: logistic_regression\nrun_id: {}\nutc_time_created: '{}'\n",
        artifact_path, MODEL_FILE, info.run_id, created
    )
}
