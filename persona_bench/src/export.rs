use crate::model::EvaluationResults;
use crate::DashboardError;

pub const EXPORT_MIME: &str = "application/json";

/// A file ready to be handed to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

pub fn export_filename(results: &EvaluationResults) -> String {
    format!("benchmark_results_{}.json", results.task_id)
}

/// Pretty-printed copy of the payload, named after its task id.
pub fn export_results(results: &EvaluationResults) -> Result<ExportFile, DashboardError> {
    Ok(ExportFile {
        filename: export_filename(results),
        contents: serde_json::to_string_pretty(results)?,
    })
}
