use serde::Serialize;
use tracing::info;

use crate::api::{BenchmarkApi, LogFile};
use crate::log::{detect_methods, is_session_log_name};
use crate::model::{UploadReply, UploadedFile};
use crate::state::{Dashboard, SettleGuard, StateStore};
use crate::DashboardError;

/// Where the detected method names came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MethodSource {
    Server,
    LocalParse,
}

/// An upload the server accepted, with its detected methods.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedLog {
    pub file: UploadedFile,
    pub message: String,
    pub sessions: u64,
    pub methods: Vec<String>,
    pub source: MethodSource,
}

impl UploadedLog {
    /// Server reply, with methods from the reply or, if it has none, from the
    /// first record of the local file.
    pub fn from_reply(reply: UploadReply, file: &LogFile) -> Self {
        let (methods, source) = if reply.methods.is_empty() {
            (detect_methods(&file.text()), MethodSource::LocalParse)
        } else {
            (reply.methods, MethodSource::Server)
        };
        Self {
            file: reply.file,
            message: reply.message,
            sessions: reply.sessions,
            methods,
            source,
        }
    }

    pub fn status_text(&self) -> String {
        format!(
            "{} ({} sessions, {} methods: {})",
            self.message,
            self.sessions,
            self.methods.len(),
            self.methods.join(", ")
        )
    }
}

/// Upload `file` and record the outcome in the store.
///
/// The outcome is also returned so callers can react to it (scrolling,
/// logging); the store already holds it either way. Refused with
/// [`DashboardError::UploadInFlight`] while another upload is outstanding.
pub async fn run_upload<S, A>(store: &S, api: &A, file: LogFile) -> Result<UploadedLog, DashboardError>
where
    S: StateStore,
    A: BenchmarkApi + ?Sized,
{
    store.update(|s| s.begin_upload())?;
    let settle = SettleGuard::new(store, Dashboard::abandon_upload);
    let outcome = upload_file(api, &file).await;
    settle.disarm();
    store.update(|s| s.finish_upload(outcome.as_ref().cloned()));
    outcome
}

async fn upload_file<A>(api: &A, file: &LogFile) -> Result<UploadedLog, DashboardError>
where
    A: BenchmarkApi + ?Sized,
{
    if !is_session_log_name(&file.name) {
        return Err(DashboardError::UnsupportedFile(file.name.clone()));
    }
    let reply = api.upload(file).await?;
    let log = UploadedLog::from_reply(reply, file);
    if log.source == MethodSource::LocalParse {
        info!(count = log.methods.len(), "server sent no methods, parsed them locally");
    }
    Ok(log)
}
