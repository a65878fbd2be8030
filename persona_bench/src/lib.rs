//! Client-side controllers and results presenter for the PersonaSteer benchmark dashboard.

use thiserror::Error;

pub mod api;
pub mod charts;
pub mod config;
pub mod evaluation;
pub mod export;
pub mod locale;
pub mod log;
pub mod model;
pub mod nav;
pub mod presenter;
pub mod progress;
pub mod selection;
pub mod state;
pub mod upload;

pub use api::{BenchmarkApi, EvaluateRequest, LogFile};
pub use charts::{ChartSlot, Disposable, LineChart, MethodColor, RadarChart};
pub use config::DashboardConfig;
pub use evaluation::run_evaluation;
pub use export::{export_filename, ExportFile};
pub use locale::{switch_language, Lang, Texts};
pub use model::{EvaluationResults, MethodResult, Metrics, UploadedFile, RADAR_DIMENSIONS};
pub use presenter::{present, ComparisonTable, MetricCard, ResultsView};
pub use progress::{CosmeticProgress, IntervalScheduler, ProgressTimer, TimerHandle};
pub use selection::MethodSelection;
pub use state::{Dashboard, DashboardView, EvaluationPhase, SettleGuard, StateStore, UploadPhase};
pub use upload::{run_upload, MethodSource, UploadedLog};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),
    /// Error text reported by the benchmark server, shown to the user verbatim.
    #[error("{0}")]
    Server(String),
    #[error("invalid server response: {0}")]
    Decode(String),
    #[error("unsupported file: {0} (expected a .jsonl session log)")]
    UnsupportedFile(String),
    #[error("no uploaded file")]
    NoUpload,
    #[error("no methods selected")]
    NoMethodsSelected,
    #[error("an evaluation is already running")]
    EvaluationInFlight,
    #[error("an upload is already running")]
    UploadInFlight,
    #[error("{0} was abandoned before the server answered")]
    Abandoned(&'static str),
    #[error("line {line}: {reason}")]
    InvalidLog { line: usize, reason: String },
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
