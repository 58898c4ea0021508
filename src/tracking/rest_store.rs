//! MLflow tracking server client (REST API 2.0)

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::config::TrackingConfig;
use super::error::{TrackingError, TrackingResult};
use super::store::{now_millis, validate_relative_path, ModelVersion, RunInfo, RunStatus, TrackingStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RUN_NAME_TAG: &str = "mlflow.runName";
const ARTIFACT_PROXY_SCHEME: &str = "mlflow-artifacts:";

/// How requests authenticate against the server
#[derive(Debug, Clone, PartialEq)]
enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

/// Tracking store that talks to an MLflow server over HTTP
pub struct RestStore {
    base_url: String,
    client: Client,
    auth: Auth,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    info: RemoteRunInfo,
}

#[derive(Debug, Deserialize)]
struct RemoteRunInfo {
    run_id: String,
    experiment_id: String,
    #[serde(default)]
    run_name: Option<String>,
    artifact_uri: String,
    #[serde(default)]
    start_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateModelVersionResponse {
    model_version: RemoteModelVersion,
}

#[derive(Debug, Deserialize)]
struct RemoteModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RunTag<'a> {
    key: &'a str,
    value: &'a str,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, config: &TrackingConfig) -> TrackingResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            auth: auth_from_config(config),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> TrackingResult<T> {
        let request = self.authorize(self.client.post(self.endpoint(path)).json(&body));
        parse_response(request.send()?)
    }

    /// POST where the response body carries nothing of interest
    fn post_empty(&self, path: &str, body: serde_json::Value) -> TrackingResult<()> {
        let _: serde_json::Value = self.post(path, body)?;
        Ok(())
    }

    /// URL the artifact proxy accepts uploads at for a run artifact file
    fn artifact_upload_url(&self, artifact_uri: &str, artifact_path: &str, file_name: &str) -> TrackingResult<String> {
        let rest = artifact_uri
            .strip_prefix(ARTIFACT_PROXY_SCHEME)
            .ok_or_else(|| TrackingError::UnsupportedUri(artifact_uri.to_string()))?;
        let root = rest.trim_start_matches('/').trim_end_matches('/');

        Ok(format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{}/{}/{}",
            self.base_url, root, artifact_path, file_name
        ))
    }
}

impl TrackingStore for RestStore {
    fn describe(&self) -> String {
        format!("MLflow server at {}", self.base_url)
    }

    fn get_or_create_experiment(&self, name: &str) -> TrackingResult<String> {
        let request = self.authorize(
            self.client
                .get(self.endpoint("experiments/get-by-name"))
                .query(&[("experiment_name", name)]),
        );

        match parse_response::<ExperimentResponse>(request.send()?) {
            Ok(found) => Ok(found.experiment.experiment_id),
            Err(e) if e.has_error_code("RESOURCE_DOES_NOT_EXIST") => {
                let created: CreateExperimentResponse =
                    self.post("experiments/create", json!({ "name": name }))?;
                Ok(created.experiment_id)
            }
            Err(e) => Err(e),
        }
    }

    fn create_run(&self, experiment_id: &str, run_name: &str, start_time: i64) -> TrackingResult<RunInfo> {
        let tags = [RunTag {
            key: RUN_NAME_TAG,
            value: run_name,
        }];
        let created: CreateRunResponse = self.post(
            "runs/create",
            json!({
                "experiment_id": experiment_id,
                "run_name": run_name,
                "start_time": start_time,
                "tags": tags,
            }),
        )?;

        let info = created.run.info;
        Ok(RunInfo {
            run_id: info.run_id,
            experiment_id: info.experiment_id,
            run_name: info.run_name.unwrap_or_else(|| run_name.to_string()),
            artifact_uri: info.artifact_uri,
            start_time: info.start_time.unwrap_or(start_time),
        })
    }

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> TrackingResult<()> {
        self.post_empty(
            "runs/log-parameter",
            json!({ "run_id": run.run_id, "key": key, "value": value }),
        )
    }

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, timestamp: i64, step: i64) -> TrackingResult<()> {
        self.post_empty(
            "runs/log-metric",
            json!({
                "run_id": run.run_id,
                "key": key,
                "value": value,
                "timestamp": timestamp,
                "step": step,
            }),
        )
    }

    fn log_artifact(
        &self,
        run: &RunInfo,
        artifact_path: &str,
        file_name: &str,
        contents: &[u8],
    ) -> TrackingResult<String> {
        validate_relative_path(artifact_path)?;
        validate_relative_path(file_name)?;

        let url = self.artifact_upload_url(&run.artifact_uri, artifact_path, file_name)?;
        let request = self.authorize(self.client.put(url).body(contents.to_vec()));
        let _: serde_json::Value = parse_response(request.send()?)?;

        Ok(format!("{}/{}", run.artifact_uri.trim_end_matches('/'), artifact_path))
    }

    fn update_run(&self, run: &RunInfo, status: RunStatus, end_time: i64) -> TrackingResult<()> {
        self.post_empty(
            "runs/update",
            json!({
                "run_id": run.run_id,
                "status": status,
                "end_time": end_time,
            }),
        )
    }

    fn register_model(&self, name: &str, source: &str, run_id: &str) -> TrackingResult<ModelVersion> {
        match self.post_empty("registered-models/create", json!({ "name": name })) {
            Ok(()) => {}
            Err(e) if e.has_error_code("RESOURCE_ALREADY_EXISTS") => {}
            Err(e) => return Err(e),
        }

        let created: CreateModelVersionResponse = self.post(
            "model-versions/create",
            json!({ "name": name, "source": source, "run_id": run_id }),
        )?;

        let version = created.model_version;
        Ok(ModelVersion {
            name: version.name,
            version: version.version,
            source: version.source.unwrap_or_else(|| source.to_string()),
            run_id: version.run_id.unwrap_or_else(|| run_id.to_string()),
            creation_timestamp: version.creation_timestamp.unwrap_or_else(now_millis),
        })
    }
}

fn auth_from_config(config: &TrackingConfig) -> Auth {
    if let Some(token) = &config.token {
        return Auth::Bearer(token.clone());
    }
    match (&config.username, &config.password) {
        (Some(username), password) => Auth::Basic {
            username: username.clone(),
            password: password.clone().unwrap_or_default(),
        },
        _ => Auth::None,
    }
}

/// Decode a success body, or turn an error status into `TrackingError::Api`
fn parse_response<T: DeserializeOwned>(response: Response) -> TrackingResult<T> {
    let status = response.status();
    let text = response.text()?;

    if !status.is_success() {
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or(ErrorBody {
            error_code: String::new(),
            message: text.clone(),
        });
        return Err(TrackingError::Api {
            status: status.as_u16(),
            error_code: body.error_code,
            message: body.message,
        });
    }

    let body = if text.trim().is_empty() { "{}" } else { text.as_str() };
    Ok(serde_json::from_str(body)?)
}
