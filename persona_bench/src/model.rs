//! Wire types shared with the benchmark server.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DashboardError;

/// Fixed radar axes, in drawing order.
pub const RADAR_DIMENSIONS: [&str; 5] = ["AVG", "N_IR", "N_R2", "Consistency", "Improvement"];

/// Server-side handle for an uploaded session log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub file_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    #[serde(rename = "AVG")]
    pub avg: f64,
    #[serde(rename = "N_IR")]
    pub n_ir: f64,
    #[serde(rename = "N_R2")]
    pub n_r2: f64,
    #[serde(flatten)]
    pub extra: IndexMap<String, f64>,
}

impl Metrics {
    pub fn new(avg: f64, n_ir: f64, n_r2: f64) -> Self {
        Self {
            avg,
            n_ir,
            n_r2,
            extra: IndexMap::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MethodResult {
    pub metrics: Metrics,
    pub al_curve: Vec<f64>,
    /// Fields the dashboard does not interpret (`total_evaluations`, per-session details).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MethodResult {
    pub fn new(metrics: Metrics, al_curve: Vec<f64>) -> Self {
        Self {
            metrics,
            al_curve,
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResults {
    pub task_id: String,
    pub total_sessions: u64,
    pub methods: IndexMap<String, MethodResult>,
    #[serde(default)]
    pub radar_data: IndexMap<String, IndexMap<String, f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvaluationResults {
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Method keys that appear on only one side of `methods` / `radar_data`.
    pub fn radar_mismatches(&self) -> Vec<&str> {
        let missing_radar = self
            .methods
            .keys()
            .filter(|name| !self.radar_data.contains_key(*name));
        let orphan_radar = self
            .radar_data
            .keys()
            .filter(|name| !self.methods.contains_key(*name));
        missing_radar.chain(orphan_radar).map(String::as_str).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadEnvelope {
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sessions: Option<u64>,
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful `/upload` reply after envelope checks.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadReply {
    pub file: UploadedFile,
    pub message: String,
    pub sessions: u64,
    pub methods: Vec<String>,
}

impl UploadEnvelope {
    pub fn into_result(self) -> Result<UploadReply, DashboardError> {
        if !self.success {
            return Err(server_error(self.error));
        }
        let filename = self
            .filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DashboardError::Decode("upload reply has no filename".into()))?;
        Ok(UploadReply {
            file: UploadedFile {
                filename,
                file_id: self.file_id,
            },
            message: self.message.unwrap_or_default(),
            sessions: self.sessions.unwrap_or(0),
            methods: self.methods.unwrap_or_default(),
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct EvaluateEnvelope {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<EvaluationResults>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub partial_results: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvaluateReply {
    pub message: String,
    pub results: EvaluationResults,
}

impl EvaluateEnvelope {
    pub fn into_result(self) -> Result<EvaluateReply, DashboardError> {
        if !self.success {
            let mut err = self.error.unwrap_or_else(|| "evaluation failed".to_string());
            if self.partial_results.is_some() {
                if let Some(note) = self.message.filter(|m| !m.is_empty()) {
                    err = format!("{err} ({note})");
                }
            }
            return Err(DashboardError::Server(err));
        }
        let results = self
            .results
            .ok_or_else(|| DashboardError::Decode("evaluate reply has no results".into()))?;
        Ok(EvaluateReply {
            message: self.message.unwrap_or_default(),
            results,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResultsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub results: Option<EvaluationResults>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ResultsEnvelope {
    pub fn into_result(self) -> Result<EvaluationResults, DashboardError> {
        if !self.success {
            return Err(server_error(self.error));
        }
        self.results
            .ok_or_else(|| DashboardError::Decode("results reply is empty".into()))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LanguageEnvelope {
    pub success: bool,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceStatus {
    pub status: String,
    pub version: String,
    pub timestamp: NaiveDateTime,
}

fn server_error(error: Option<String>) -> DashboardError {
    DashboardError::Server(error.unwrap_or_else(|| "request failed".to_string()))
}
