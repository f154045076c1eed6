// Domain modules
pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod form;
pub mod mode;
pub mod results;
pub mod selection;

pub use batch::BatchFile;
pub use config::{ChurnConfig, ServiceConfig, UiConfig, DEFAULT_HOST, HOST_ENV};
pub use error::{ChurnError, ErrorKind, Result, ValidationError};
pub use features::{FeatureKey, FeatureVector};
pub use form::FormState;
pub use mode::{Form, ViewMode};
pub use results::{
    render_batch, render_evaluation, render_prediction, BatchResult, EvaluationResult, Flow,
    PredictionResult, ResultState,
};
pub use selection::{EvaluationRequest, Metric, ModelKind};

/// Root state container for one session of the churn page
#[derive(Debug, Clone, Default)]
pub struct ChurnSession {
    pub form: FormState,
    pub results: ResultState,
    pub mode: ViewMode,
    /// Requests sent but not yet answered
    pub in_flight: usize,
}

impl ChurnSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn begin_request(&mut self) {
        self.in_flight += 1;
    }

    pub fn finish_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
