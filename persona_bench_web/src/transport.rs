//! `gloo-net` implementation of [`BenchmarkApi`] for same-origin requests.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use persona_bench::model::{
    EvaluateEnvelope, EvaluateReply, LanguageEnvelope, ResultsEnvelope, ServiceStatus,
    UploadEnvelope, UploadReply,
};
use persona_bench::{BenchmarkApi, DashboardError, EvaluateRequest, EvaluationResults, Lang, LogFile};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use web_sys::{Blob, FormData};

#[derive(Clone, Debug, Default)]
pub struct GlooApi {
    base: String,
}

impl GlooApi {
    /// Requests go to `base` + path; an empty base means the page's own origin.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn network(err: gloo_net::Error) -> DashboardError {
    DashboardError::Network(err.to_string())
}

fn js_error(err: JsValue) -> DashboardError {
    DashboardError::Network(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DashboardError> {
    let status = response.status();
    let body = response.text().await.map_err(network)?;
    serde_json::from_str(&body).map_err(|err| DashboardError::Decode(format!("HTTP {status}: {err}")))
}

fn multipart(file: &LogFile) -> Result<FormData, DashboardError> {
    let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
    let parts = js_sys::Array::of1(&bytes);
    let blob = Blob::new_with_u8_array_sequence(&parts).map_err(js_error)?;
    let form = FormData::new().map_err(js_error)?;
    form.append_with_blob_and_filename("file", &blob, &file.name)
        .map_err(js_error)?;
    Ok(form)
}

#[async_trait(?Send)]
impl BenchmarkApi for GlooApi {
    async fn upload(&self, file: &LogFile) -> Result<UploadReply, DashboardError> {
        let response = Request::post(&self.url("/upload"))
            .body(multipart(file)?)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        decode::<UploadEnvelope>(response).await?.into_result()
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateReply, DashboardError> {
        let response = Request::post(&self.url("/evaluate"))
            .json(request)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        decode::<EvaluateEnvelope>(response).await?.into_result()
    }

    async fn set_language(&self, lang: Lang) -> Result<bool, DashboardError> {
        let response = Request::get(&self.url(&format!("/set_language/{}", lang.code())))
            .send()
            .await
            .map_err(network)?;
        Ok(decode::<LanguageEnvelope>(response).await?.success)
    }

    async fn fetch_results(&self, task_id: &str) -> Result<EvaluationResults, DashboardError> {
        let response = Request::get(&self.url(&format!("/results/{task_id}")))
            .send()
            .await
            .map_err(network)?;
        decode::<ResultsEnvelope>(response).await?.into_result()
    }

    async fn status(&self) -> Result<ServiceStatus, DashboardError> {
        let response = Request::get(&self.url("/api/status"))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }
}
