//! Request dispatcher - turns form state into service calls
//!
//! Each submit spawns one task; completions come back over a channel and are
//! applied to the session in the order they arrive, so when requests overlap
//! the last response to land is the one shown.

use std::future::Future;
use std::sync::Arc;

use churn_core::{
    BatchResult, ChurnError, ChurnSession, EvaluationResult, Flow, PredictionResult, Result,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::ChurnApi;

#[derive(Debug)]
pub enum DispatchEvent {
    Evaluation {
        id: u64,
        result: Result<EvaluationResult>,
    },
    Prediction {
        id: u64,
        result: Result<PredictionResult>,
    },
    Batch {
        id: u64,
        rows: usize,
        result: Result<BatchResult>,
    },
    Cancelled {
        id: u64,
        flow: Flow,
    },
}

impl DispatchEvent {
    /// Failure event for a request that never produced a response of its own
    fn failed(id: u64, flow: Flow, error: ChurnError) -> Self {
        match flow {
            Flow::Evaluation => DispatchEvent::Evaluation { id, result: Err(error) },
            Flow::SinglePrediction => DispatchEvent::Prediction { id, result: Err(error) },
            Flow::BatchPrediction => DispatchEvent::Batch {
                id,
                rows: 0,
                result: Err(error),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Stored,
    Failed(String),
    Cancelled,
}

/// What happened to one request once its response was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: u64,
    pub flow: Flow,
    pub outcome: Outcome,
}

/// Handle to an in-flight request. Dropping it does nothing; `cancel` discards
/// the response when it lands.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub id: u64,
    pub flow: Flow,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn cancel(&self) {
        info!(id = self.id, flow = self.flow.label(), "Cancelling request");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Dispatcher<A: ChurnApi + 'static> {
    api: Arc<A>,
    tx: mpsc::UnboundedSender<DispatchEvent>,
    rx: mpsc::UnboundedReceiver<DispatchEvent>,
    next_id: u64,
    pending: usize,
}

impl<A: ChurnApi + 'static> Dispatcher<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            tx,
            rx,
            next_id: 1,
            pending: 0,
        }
    }

    /// Requests whose completion has not been applied yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Must be called inside a tokio runtime.
    pub fn submit_evaluation(&mut self, session: &mut ChurnSession) -> Result<RequestHandle> {
        let request = session.form.evaluation_request().inspect_err(|e| {
            warn!("Evaluation not sent: {}", e);
        })?;

        info!(model = %request.model, metric = %request.metric, "Submitting evaluation");
        let api = self.api.clone();
        Ok(self.spawn(session, Flow::Evaluation, move |id, token| async move {
            tokio::select! {
                _ = token.cancelled() => DispatchEvent::Cancelled { id, flow: Flow::Evaluation },
                result = api.evaluate(&request) => DispatchEvent::Evaluation { id, result },
            }
        }))
    }

    /// Sends the feature vector as it stands; blank fields go out as empty strings.
    pub fn submit_single_prediction(
        &mut self,
        session: &mut ChurnSession,
    ) -> Result<RequestHandle> {
        let features = session.form.features.clone();
        let blank = features.blank_fields().len();
        if blank > 0 {
            debug!("Submitting prediction with {} blank fields", blank);
        }

        info!("Submitting single prediction");
        let api = self.api.clone();
        Ok(self.spawn(session, Flow::SinglePrediction, move |id, token| async move {
            tokio::select! {
                _ = token.cancelled() => DispatchEvent::Cancelled { id, flow: Flow::SinglePrediction },
                result = api.predict(&features) => DispatchEvent::Prediction { id, result },
            }
        }))
    }

    pub fn submit_batch_prediction(&mut self, session: &mut ChurnSession) -> Result<RequestHandle> {
        let file = session
            .form
            .batch_file()
            .inspect_err(|e| warn!("Bulk prediction not sent: {}", e))?
            .clone();
        let rows = file.row_count();

        info!(file = %file.file_name, rows, "Submitting bulk prediction");
        let api = self.api.clone();
        Ok(self.spawn(session, Flow::BatchPrediction, move |id, token| async move {
            tokio::select! {
                _ = token.cancelled() => DispatchEvent::Cancelled { id, flow: Flow::BatchPrediction },
                result = api.predict_list(&file) => DispatchEvent::Batch { id, rows, result },
            }
        }))
    }

    fn spawn<F, Fut>(&mut self, session: &mut ChurnSession, flow: Flow, make: F) -> RequestHandle
    where
        F: FnOnce(u64, CancellationToken) -> Fut,
        Fut: Future<Output = DispatchEvent> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.pending += 1;
        session.begin_request();

        let token = CancellationToken::new();
        let task = make(id, token.clone());
        let tx = self.tx.clone();

        let request = tokio::spawn(task);
        tokio::spawn(async move {
            let event = match request.await {
                Ok(event) => event,
                Err(e) => {
                    error!(id, flow = flow.label(), "Request task died: {}", e);
                    DispatchEvent::failed(
                        id,
                        flow,
                        ChurnError::Http(format!("request task failed: {}", e)),
                    )
                }
            };
            if tx.send(event).is_err() {
                debug!("Dispatcher dropped before request {} finished", id);
            }
        });

        RequestHandle { id, flow, token }
    }

    /// Apply every completion that has already arrived, without waiting
    pub fn poll(&mut self, session: &mut ChurnSession) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            completions.push(self.apply(session, event));
        }
        completions
    }

    /// Wait for the next completion. Returns `None` when nothing is in flight.
    pub async fn next_event(&mut self, session: &mut ChurnSession) -> Option<Completion> {
        if let Ok(event) = self.rx.try_recv() {
            return Some(self.apply(session, event));
        }
        if self.pending == 0 {
            return None;
        }
        let event = self.rx.recv().await?;
        Some(self.apply(session, event))
    }

    /// Wait until every submitted request has completed
    pub async fn wait_idle(&mut self, session: &mut ChurnSession) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_event(session).await {
            completions.push(completion);
        }
        completions
    }

    fn apply(&mut self, session: &mut ChurnSession, event: DispatchEvent) -> Completion {
        self.pending = self.pending.saturating_sub(1);
        session.finish_request();

        match event {
            DispatchEvent::Evaluation { id, result } => {
                let outcome = store(id, Flow::Evaluation, result, |r| {
                    session.results.set_evaluation(r)
                });
                Completion { id, flow: Flow::Evaluation, outcome }
            }
            DispatchEvent::Prediction { id, result } => {
                let outcome = store(id, Flow::SinglePrediction, result, |r| {
                    session.results.set_prediction(r)
                });
                Completion { id, flow: Flow::SinglePrediction, outcome }
            }
            DispatchEvent::Batch { id, rows, result } => {
                if let Ok(batch) = &result {
                    if batch.predictions.len() != rows {
                        warn!(
                            id,
                            rows,
                            predictions = batch.predictions.len(),
                            "Prediction count differs from uploaded row count"
                        );
                    }
                }
                let outcome = store(id, Flow::BatchPrediction, result, |r| {
                    session.results.set_batch(r)
                });
                Completion { id, flow: Flow::BatchPrediction, outcome }
            }
            DispatchEvent::Cancelled { id, flow } => {
                debug!(id, flow = flow.label(), "Discarded cancelled request");
                Completion { id, flow, outcome: Outcome::Cancelled }
            }
        }
    }
}

fn store<T>(id: u64, flow: Flow, result: Result<T>, set: impl FnOnce(T)) -> Outcome {
    match result {
        Ok(value) => {
            info!(id, flow = flow.label(), "Result received");
            set(value);
            Outcome::Stored
        }
        Err(e) => {
            log_failure(id, flow, &e);
            Outcome::Failed(e.to_string())
        }
    }
}

fn log_failure(id: u64, flow: Flow, e: &ChurnError) {
    error!(id, kind = ?e.kind(), "Error during {}: {}", flow.label(), e);
}
