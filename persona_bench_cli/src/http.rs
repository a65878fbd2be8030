//! `reqwest` transport and a tokio interval scheduler for the shared controllers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use persona_bench::model::{
    EvaluateEnvelope, EvaluateReply, LanguageEnvelope, ResultsEnvelope, ServiceStatus,
    UploadEnvelope, UploadReply,
};
use persona_bench::{
    BenchmarkApi, DashboardError, EvaluateRequest, EvaluationResults, IntervalScheduler, Lang,
    LogFile, TimerHandle,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::debug;

/// Talks to a running benchmark server.
///
/// Cookies are kept for the lifetime of the client because the server stores
/// the page language in its session.
pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    pub fn new(server: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base: server.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn network(err: reqwest::Error) -> DashboardError {
    DashboardError::Network(err.to_string())
}

/// The server answers failures with a JSON envelope and a 4xx/5xx status, so
/// the body is decoded whatever the status code.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DashboardError> {
    let status = response.status();
    let body = response.text().await.map_err(network)?;
    debug!(%status, bytes = body.len(), "server reply");
    serde_json::from_str(&body).map_err(|err| DashboardError::Decode(format!("HTTP {status}: {err}")))
}

#[async_trait(?Send)]
impl BenchmarkApi for HttpApi {
    async fn upload(&self, file: &LogFile) -> Result<UploadReply, DashboardError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/octet-stream")
            .map_err(network)?;
        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(network)?;
        decode::<UploadEnvelope>(response).await?.into_result()
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateReply, DashboardError> {
        let response = self
            .client
            .post(self.url("/evaluate"))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        decode::<EvaluateEnvelope>(response).await?.into_result()
    }

    async fn set_language(&self, lang: Lang) -> Result<bool, DashboardError> {
        let response = self
            .client
            .get(self.url(&format!("/set_language/{}", lang.code())))
            .send()
            .await
            .map_err(network)?;
        Ok(decode::<LanguageEnvelope>(response).await?.success)
    }

    async fn fetch_results(&self, task_id: &str) -> Result<EvaluationResults, DashboardError> {
        let response = self
            .client
            .get(self.url(&format!("/results/{task_id}")))
            .send()
            .await
            .map_err(network)?;
        decode::<ResultsEnvelope>(response).await?.into_result()
    }

    async fn status(&self) -> Result<ServiceStatus, DashboardError> {
        let response = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }
}

/// Runs ticks as local tasks; must be used inside a `LocalSet`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

pub struct TokioTicker(JoinHandle<()>);

impl TimerHandle for TokioTicker {
    fn cancel(self) {
        self.0.abort();
    }
}

impl IntervalScheduler for TokioScheduler {
    type Handle = TokioTicker;

    fn every(&self, period_ms: u32, mut tick: Box<dyn FnMut()>) -> TokioTicker {
        let period = Duration::from_millis(u64::from(period_ms.max(1)));
        TokioTicker(tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                tick();
            }
        }))
    }
}
