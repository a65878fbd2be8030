//! Transport seam between the controllers and the benchmark server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locale::Lang;
use crate::model::{EvaluateReply, EvaluationResults, ServiceStatus, UploadReply};
use crate::DashboardError;

/// A session log picked by the user, held in memory until upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LogFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Body of `POST /evaluate`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluateRequest {
    pub filename: String,
    pub methods: Vec<String>,
}

/// The HTTP endpoints the dashboard consumes.
///
/// Implementations decode the `{success, ...}` envelopes through the
/// `into_result` helpers in [`crate::model`], so a `success: false` reply
/// arrives here as [`DashboardError::Server`].
#[async_trait(?Send)]
pub trait BenchmarkApi {
    async fn upload(&self, file: &LogFile) -> Result<UploadReply, DashboardError>;

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateReply, DashboardError>;

    async fn set_language(&self, lang: Lang) -> Result<bool, DashboardError>;

    async fn fetch_results(&self, task_id: &str) -> Result<EvaluationResults, DashboardError>;

    async fn status(&self) -> Result<ServiceStatus, DashboardError>;
}
