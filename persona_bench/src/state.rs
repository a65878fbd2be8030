//! Application state of the dashboard.
//!
//! Each user action or settled request is one method on [`Dashboard`];
//! [`Dashboard::render`] derives everything the page shows from the current
//! state and nothing else.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::EvaluateRequest;
use crate::config::DashboardConfig;
use crate::export::{export_results, ExportFile};
use crate::locale::Lang;
use crate::model::{EvaluateReply, EvaluationResults};
use crate::nav::NavState;
use crate::presenter::{present, ResultsView};
use crate::progress::CosmeticProgress;
use crate::selection::{MethodSelection, MethodTag};
use crate::upload::UploadedLog;
use crate::DashboardError;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Ready(UploadedLog),
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EvaluationPhase {
    #[default]
    Idle,
    Running,
    Succeeded(String),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    upload: UploadPhase,
    selection: MethodSelection,
    evaluation: EvaluationPhase,
    progress: CosmeticProgress,
    results: Option<EvaluationResults>,
    results_epoch: u64,
    nav: NavState,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let progress = CosmeticProgress::new(&config);
        Self {
            config,
            upload: UploadPhase::Idle,
            selection: MethodSelection::default(),
            evaluation: EvaluationPhase::Idle,
            progress,
            results: None,
            results_epoch: 0,
            nav: NavState::default(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn lang(&self) -> Lang {
        self.config.lang
    }

    pub fn upload_phase(&self) -> &UploadPhase {
        &self.upload
    }

    pub fn uploaded(&self) -> Option<&UploadedLog> {
        match &self.upload {
            UploadPhase::Ready(log) => Some(log),
            _ => None,
        }
    }

    pub fn selection(&self) -> &MethodSelection {
        &self.selection
    }

    pub fn evaluation_phase(&self) -> &EvaluationPhase {
        &self.evaluation
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress.percent()
    }

    pub fn results(&self) -> Option<&EvaluationResults> {
        self.results.as_ref()
    }

    /// Bumped each time a new result set replaces the old one.
    pub fn results_epoch(&self) -> u64 {
        self.results_epoch
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluation == EvaluationPhase::Running
    }

    pub fn can_start_evaluation(&self) -> bool {
        !self.is_evaluating() && self.selection.can_start(self.uploaded().is_some())
    }

    pub fn is_uploading(&self) -> bool {
        self.upload == UploadPhase::Uploading
    }

    /// One upload at a time; a second one is refused until the first settles.
    pub fn begin_upload(&mut self) -> Result<(), DashboardError> {
        if self.is_uploading() {
            return Err(DashboardError::UploadInFlight);
        }
        self.upload = UploadPhase::Uploading;
        Ok(())
    }

    /// A new upload replaces the method tags; a failed one clears them.
    pub fn finish_upload(&mut self, outcome: Result<UploadedLog, &DashboardError>) {
        match outcome {
            Ok(log) => {
                info!(
                    filename = %log.file.filename,
                    sessions = log.sessions,
                    methods = log.methods.len(),
                    "upload accepted"
                );
                self.selection = MethodSelection::new(log.methods.iter().cloned());
                self.upload = UploadPhase::Ready(log);
            }
            Err(err) => {
                warn!("upload failed: {err}");
                self.selection = MethodSelection::default();
                self.upload = UploadPhase::Failed(err.to_string());
            }
        }
    }

    pub fn toggle_method(&mut self, method: &str) -> bool {
        self.selection.toggle(method)
    }

    /// Admission check for a new evaluation; on success the attempt is running.
    pub fn begin_evaluation(&mut self) -> Result<EvaluateRequest, DashboardError> {
        if self.is_evaluating() {
            return Err(DashboardError::EvaluationInFlight);
        }
        let filename = self
            .uploaded()
            .map(|log| log.file.filename.clone())
            .ok_or(DashboardError::NoUpload)?;
        let methods = self.selection.selected();
        if methods.is_empty() {
            return Err(DashboardError::NoMethodsSelected);
        }
        self.evaluation = EvaluationPhase::Running;
        self.progress.start();
        debug!(%filename, ?methods, "evaluation started");
        Ok(EvaluateRequest { filename, methods })
    }

    /// Timer callback. Ignored once the attempt has settled.
    pub fn tick_progress(&mut self) {
        if self.is_evaluating() {
            self.progress.tick();
        }
    }

    pub fn finish_evaluation(&mut self, outcome: Result<EvaluateReply, &DashboardError>) {
        match outcome {
            Ok(reply) => {
                info!(
                    task_id = %reply.results.task_id,
                    methods = reply.results.methods.len(),
                    "evaluation finished"
                );
                self.progress.complete();
                self.results = Some(reply.results);
                self.results_epoch += 1;
                self.evaluation = EvaluationPhase::Succeeded(reply.message);
            }
            Err(err) => {
                warn!("evaluation failed: {err}");
                self.progress.reset();
                self.evaluation = EvaluationPhase::Failed(err.to_string());
            }
        }
    }

    /// Settle an upload whose request was dropped before it answered.
    pub fn abandon_upload(&mut self) {
        if self.is_uploading() {
            self.finish_upload(Err(&DashboardError::Abandoned("upload")));
        }
    }

    /// Settle an evaluation whose request was dropped before it answered.
    pub fn abandon_evaluation(&mut self) {
        if self.is_evaluating() {
            self.finish_evaluation(Err(&DashboardError::Abandoned("evaluation")));
        }
    }

    /// Show an already-exported or fetched result set without evaluating.
    pub fn load_results(&mut self, results: EvaluationResults) {
        self.results = Some(results);
        self.results_epoch += 1;
    }

    pub fn follow_link<F>(&mut self, href: &str, target_exists: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        self.nav.follow(href, target_exists)
    }

    /// `None` until some results exist.
    pub fn export(&self) -> Option<Result<ExportFile, DashboardError>> {
        self.results.as_ref().map(export_results)
    }

    pub fn render(&self) -> DashboardView {
        let texts = self.lang().texts();
        let selected = self.selection.selected().len();

        let upload_status = match &self.upload {
            UploadPhase::Idle => None,
            UploadPhase::Uploading => Some(StatusLine::pending(texts.uploading)),
            UploadPhase::Ready(log) => Some(StatusLine::ok(log.status_text())),
            UploadPhase::Failed(err) => Some(StatusLine::error(err.clone())),
        };

        let progress = match &self.evaluation {
            EvaluationPhase::Idle => None,
            EvaluationPhase::Running => Some(ProgressView {
                percent: self.progress.percent(),
                text: texts.evaluating.to_string(),
                evaluating: true,
            }),
            EvaluationPhase::Succeeded(message) => Some(ProgressView {
                percent: self.progress.percent(),
                text: format!("✅ {message}"),
                evaluating: false,
            }),
            EvaluationPhase::Failed(err) => Some(ProgressView {
                percent: self.progress.percent(),
                text: format!("❌ {err}"),
                evaluating: false,
            }),
        };

        DashboardView {
            lang: self.lang(),
            upload_status,
            upload_enabled: !self.is_uploading(),
            method_tags: self.selection.tags().to_vec(),
            start_enabled: self.can_start_evaluation(),
            start_label: self.lang().start_button_label(selected),
            progress,
            results: self.results.as_ref().map(present),
            export_available: self.results.is_some(),
            active_link: self.nav.active().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum StatusKind {
    Pending,
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    fn pending(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Pending, text: text.into() }
    }

    fn ok(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Ok, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }

    pub fn icon(&self) -> &'static str {
        match self.kind {
            StatusKind::Pending => "⏳",
            StatusKind::Ok => "✅",
            StatusKind::Error => "❌",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressView {
    pub percent: f64,
    pub text: String,
    pub evaluating: bool,
}

/// Snapshot of everything the page displays.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub lang: Lang,
    pub upload_status: Option<StatusLine>,
    pub upload_enabled: bool,
    pub method_tags: Vec<MethodTag>,
    pub start_enabled: bool,
    pub start_label: String,
    pub progress: Option<ProgressView>,
    pub results: Option<ResultsView>,
    pub export_available: bool,
    pub active_link: Option<String>,
}

/// Shared, mutable home of a [`Dashboard`] for async controllers.
pub trait StateStore: Clone + 'static {
    fn update<R>(&self, f: impl FnOnce(&mut Dashboard) -> R) -> R;

    fn read<R>(&self, f: impl FnOnce(&Dashboard) -> R) -> R {
        self.update(|state| f(state))
    }
}

impl StateStore for Rc<RefCell<Dashboard>> {
    fn update<R>(&self, f: impl FnOnce(&mut Dashboard) -> R) -> R {
        f(&mut self.borrow_mut())
    }

    fn read<R>(&self, f: impl FnOnce(&Dashboard) -> R) -> R {
        f(&self.borrow())
    }
}

/// Settles an in-flight request if its future is dropped before it answers.
///
/// Armed on admission; [`SettleGuard::disarm`] once the outcome is recorded.
pub struct SettleGuard<'a, S: StateStore> {
    store: &'a S,
    abandon: fn(&mut Dashboard),
    armed: bool,
}

impl<'a, S: StateStore> SettleGuard<'a, S> {
    pub fn new(store: &'a S, abandon: fn(&mut Dashboard)) -> Self {
        Self { store, abandon, armed: true }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: StateStore> Drop for SettleGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.store.update(self.abandon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UploadedFile;
    use crate::upload::MethodSource;

    fn uploaded(methods: &[&str]) -> UploadedLog {
        UploadedLog {
            file: UploadedFile {
                filename: "f1".into(),
                file_id: None,
            },
            message: "File uploaded successfully".into(),
            sessions: 12,
            methods: methods.iter().map(|m| m.to_string()).collect(),
            source: MethodSource::Server,
        }
    }

    #[test]
    fn start_is_gated_on_upload_and_selection() {
        let mut dash = Dashboard::default();
        assert!(matches!(dash.begin_evaluation(), Err(DashboardError::NoUpload)));
        dash.finish_upload(Ok(uploaded(&["Base", "RAG"])));
        let view = dash.render();
        assert_eq!(view.method_tags.len(), 2);
        assert!(!view.start_enabled);
        assert!(matches!(
            dash.begin_evaluation(),
            Err(DashboardError::NoMethodsSelected)
        ));
        dash.toggle_method("RAG");
        let view = dash.render();
        assert!(view.start_enabled);
        assert_eq!(view.start_label, "开始评测 (1 个方法)");
    }

    #[test]
    fn second_start_while_running_is_refused() {
        let mut dash = Dashboard::default();
        dash.finish_upload(Ok(uploaded(&["Base"])));
        dash.toggle_method("Base");
        let req = dash.begin_evaluation().unwrap();
        assert_eq!(req.methods, vec!["Base"]);
        assert!(!dash.render().start_enabled);
        assert!(matches!(
            dash.begin_evaluation(),
            Err(DashboardError::EvaluationInFlight)
        ));
    }

    #[test]
    fn failure_resets_progress_and_reenables_start() {
        let mut dash = Dashboard::default();
        dash.finish_upload(Ok(uploaded(&["Base"])));
        dash.toggle_method("Base");
        dash.begin_evaluation().unwrap();
        dash.tick_progress();
        dash.finish_evaluation(Err(&DashboardError::Server("评测出错: boom".into())));
        let view = dash.render();
        assert!(view.start_enabled);
        let progress = view.progress.unwrap();
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.text, "❌ 评测出错: boom");
        dash.tick_progress();
        assert_eq!(dash.progress_percent(), 0.0);
    }

    #[test]
    fn failed_upload_shows_error_and_clears_tags() {
        let mut dash = Dashboard::default();
        dash.finish_upload(Ok(uploaded(&["Base"])));
        dash.finish_upload(Err(&DashboardError::Server("请选择文件".into())));
        let view = dash.render();
        let status = view.upload_status.unwrap();
        assert_eq!(status.icon(), "❌");
        assert_eq!(status.text, "请选择文件");
        assert!(view.method_tags.is_empty());
    }

    #[test]
    fn second_upload_is_refused_until_the_first_settles() {
        let mut dash = Dashboard::default();
        dash.begin_upload().unwrap();
        assert!(!dash.render().upload_enabled);
        assert!(matches!(dash.begin_upload(), Err(DashboardError::UploadInFlight)));
        dash.finish_upload(Ok(uploaded(&["Base"])));
        assert!(dash.render().upload_enabled);
        dash.begin_upload().unwrap();
    }

    #[test]
    fn abandoning_settles_only_running_work() {
        let mut dash = Dashboard::default();
        dash.begin_upload().unwrap();
        dash.abandon_upload();
        assert_eq!(
            dash.upload_phase(),
            &UploadPhase::Failed("upload was abandoned before the server answered".into())
        );

        dash.finish_upload(Ok(uploaded(&["Base"])));
        dash.toggle_method("Base");
        dash.abandon_evaluation();
        assert_eq!(dash.evaluation_phase(), &EvaluationPhase::Idle);
        dash.begin_evaluation().unwrap();
        dash.abandon_evaluation();
        assert!(!dash.is_evaluating());
        assert!(dash.render().start_enabled);
        assert_eq!(dash.progress_percent(), 0.0);
    }

    #[test]
    fn export_is_noop_without_results() {
        assert!(Dashboard::default().export().is_none());
    }
}
