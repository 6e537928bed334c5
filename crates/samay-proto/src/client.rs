//! HTTP client for the forecasting service.
//!
//! Every action goes through the same three steps: send the request, hand the
//! raw response to the normalizer, and poll the task it names (if any).

use std::path::Path;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{ApiConfig, PollingConfig};
use crate::controller::ActionRequest;
use crate::error::ApiError;
use crate::normalizer::{normalize, Normalized};
use crate::poller::{ProgressFn, TaskPoller};
use crate::protocol::{
    DATASET_FIELD, FINETUNE_PATH, LOAD_MODEL_PATH, RUN_INFERENCE_PATH, UPLOAD_DATASET_PATH,
};

#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    base_url: String,
    poller: TaskPoller,
}

impl ForecastClient {
    pub fn new(api: &ApiConfig, polling: &PollingConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("samay/", env!("CARGO_PKG_VERSION")))
            .timeout(api.request_timeout())
            .build()?;
        let mut base_url = api.base_url.trim().to_string();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let poller = TaskPoller::new(http.clone(), base_url.clone(), polling);
        Ok(Self {
            http,
            base_url,
            poller,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared connection pool, for plain downloads outside the action protocol.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for a server-relative path such as a plot `result_path`.
    pub fn resolve_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one action request to completion: send, normalize, poll.
    pub async fn call(
        &self,
        request: &ActionRequest,
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Value, ApiError> {
        info!("{}: sending request", request.kind().label());
        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            sent = self.send(request) => sent?,
        };
        debug!("{}: HTTP {}", request.kind().label(), status);
        self.resolve(status, &body, cancel, on_progress).await
    }

    /// Normalize a response and, for deferred ones, poll the named task.
    pub async fn resolve(
        &self,
        status: StatusCode,
        body: &[u8],
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Value, ApiError> {
        match normalize(status, body)? {
            Normalized::Immediate(result) => Ok(result),
            Normalized::Deferred(task_id) => self.poller.poll(&task_id, cancel, on_progress).await,
        }
    }

    async fn send(&self, request: &ActionRequest) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let response = match request {
            ActionRequest::LoadModel(body) => self.post_json(LOAD_MODEL_PATH, body).await?,
            ActionRequest::UploadDataset { file } => self.post_dataset(file).await?,
            ActionRequest::Finetune(body) => self.post_json(FINETUNE_PATH, body).await?,
            ActionRequest::GeneratePlot(body) => self.post_json(RUN_INFERENCE_PATH, body).await?,
        };
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.resolve_url(path);
        Ok(self.http.post(&url).json(body).send().await?)
    }

    async fn post_dataset(&self, file: &Path) -> Result<reqwest::Response, ApiError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset.csv")
            .to_string();
        debug!("uploading {} ({} bytes)", file_name, bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part(DATASET_FIELD, part);
        let url = self.resolve_url(UPLOAD_DATASET_PATH);
        Ok(self.http.post(&url).multipart(form).send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = ApiConfig {
            base_url: "http://localhost:5000//".to_string(),
            ..ApiConfig::default()
        };
        let client = ForecastClient::new(&api, &PollingConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.resolve_url("/plots/1.png"),
            "http://localhost:5000/plots/1.png"
        );
    }
}
