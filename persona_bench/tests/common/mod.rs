#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use persona_bench::model::{EvaluateReply, ServiceStatus, UploadReply, UploadedFile};
use persona_bench::{
    BenchmarkApi, DashboardError, EvaluateRequest, EvaluationResults, IntervalScheduler, Lang,
    LogFile, TimerHandle,
};

pub const SCENARIO_RESULTS: &str = r#"{
    "task_id": "c0ffee01",
    "total_sessions": 12,
    "methods": {
        "Base": {"metrics": {"AVG": 70, "N_IR": 10, "N_R2": 5}, "al_curve": [50, 60, 70]},
        "RAG": {"metrics": {"AVG": 85, "N_IR": 20, "N_R2": 15}, "al_curve": [60, 80]}
    },
    "radar_data": {
        "Base": {"AVG": 70, "N_IR": 100, "N_R2": 5, "Consistency": 82, "Improvement": 70},
        "RAG": {"AVG": 85, "N_IR": 100, "N_R2": 15, "Consistency": 60, "Improvement": 70}
    }
}"#;

pub fn scenario_results() -> EvaluationResults {
    serde_json::from_str(SCENARIO_RESULTS).expect("scenario payload parses")
}

pub fn upload_reply(methods: &[&str]) -> UploadReply {
    UploadReply {
        file: UploadedFile {
            filename: "f1".into(),
            file_id: Some("f1".into()),
        },
        message: "File uploaded successfully".into(),
        sessions: 12,
        methods: methods.iter().map(|m| m.to_string()).collect(),
    }
}

type EvaluateOutcome = Result<EvaluateReply, DashboardError>;
type UploadOutcome = Result<UploadReply, DashboardError>;

/// In-memory server. Uploads and evaluations either answer immediately or wait on a gate.
#[derive(Default)]
pub struct FakeApi {
    pub upload_reply: RefCell<Option<UploadOutcome>>,
    pub upload_gate: RefCell<Option<oneshot::Receiver<UploadOutcome>>>,
    pub evaluate_reply: RefCell<Option<EvaluateOutcome>>,
    pub evaluate_gate: RefCell<Option<oneshot::Receiver<EvaluateOutcome>>>,
    pub upload_calls: Cell<u32>,
    pub evaluate_calls: Cell<u32>,
    pub last_request: RefCell<Option<EvaluateRequest>>,
    pub language: Cell<Option<Lang>>,
}

impl FakeApi {
    pub fn with_upload(reply: UploadReply) -> Self {
        let api = FakeApi::default();
        *api.upload_reply.borrow_mut() = Some(Ok(reply));
        api
    }

    pub fn gate_upload(&self) -> oneshot::Sender<UploadOutcome> {
        let (tx, rx) = oneshot::channel();
        *self.upload_gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn answer_evaluation(&self, outcome: EvaluateOutcome) {
        *self.evaluate_reply.borrow_mut() = Some(outcome);
    }

    pub fn gate_evaluation(&self) -> oneshot::Sender<EvaluateOutcome> {
        let (tx, rx) = oneshot::channel();
        *self.evaluate_gate.borrow_mut() = Some(rx);
        tx
    }
}

#[async_trait(?Send)]
impl BenchmarkApi for FakeApi {
    async fn upload(&self, _file: &LogFile) -> Result<UploadReply, DashboardError> {
        self.upload_calls.set(self.upload_calls.get() + 1);
        if let Some(outcome) = self.upload_reply.borrow_mut().take() {
            return outcome;
        }
        let gate = self.upload_gate.borrow_mut().take();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DashboardError::Network("connection dropped".into()))),
            None => Err(DashboardError::Network("no upload scripted".into())),
        }
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateReply, DashboardError> {
        self.evaluate_calls.set(self.evaluate_calls.get() + 1);
        *self.last_request.borrow_mut() = Some(request.clone());
        if let Some(outcome) = self.evaluate_reply.borrow_mut().take() {
            return outcome;
        }
        let gate = self.evaluate_gate.borrow_mut().take();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DashboardError::Network("connection dropped".into()))),
            None => Err(DashboardError::Network("no evaluation scripted".into())),
        }
    }

    async fn set_language(&self, lang: Lang) -> Result<bool, DashboardError> {
        self.language.set(Some(lang));
        Ok(true)
    }

    async fn fetch_results(&self, _task_id: &str) -> Result<EvaluationResults, DashboardError> {
        Ok(scenario_results())
    }

    async fn status(&self) -> Result<ServiceStatus, DashboardError> {
        Err(DashboardError::Network("offline".into()))
    }
}

struct Ticker {
    tick: Box<dyn FnMut()>,
    live: Rc<Cell<bool>>,
}

/// Interval scheduler whose ticks fire only when the test says so.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tickers: Rc<RefCell<Vec<Ticker>>>,
    pub started: Rc<Cell<u32>>,
    pub cancels: Rc<Cell<u32>>,
}

pub struct ManualHandle {
    live: Rc<Cell<bool>>,
    cancels: Rc<Cell<u32>>,
}

impl TimerHandle for ManualHandle {
    fn cancel(self) {
        self.live.set(false);
        self.cancels.set(self.cancels.get() + 1);
    }
}

impl IntervalScheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn every(&self, _period_ms: u32, tick: Box<dyn FnMut()>) -> ManualHandle {
        let live = Rc::new(Cell::new(true));
        self.started.set(self.started.get() + 1);
        self.tickers.borrow_mut().push(Ticker {
            tick,
            live: live.clone(),
        });
        ManualHandle {
            live,
            cancels: self.cancels.clone(),
        }
    }
}

impl ManualScheduler {
    /// Fire every live ticker once; returns how many fired.
    pub fn fire(&self) -> usize {
        let mut fired = 0;
        for ticker in self.tickers.borrow_mut().iter_mut() {
            if ticker.live.get() {
                (ticker.tick)();
                fired += 1;
            }
        }
        fired
    }
}
