pub mod api;
pub mod dispatcher;
pub mod http;

pub use api::ChurnApi;
pub use dispatcher::{Completion, DispatchEvent, Dispatcher, Outcome, RequestHandle};
pub use http::ChurnClient;

// Re-export core types so front ends only depend on this crate
pub use churn_core::{
    BatchFile, BatchResult, ChurnConfig, ChurnError, ChurnSession, ErrorKind, EvaluationRequest,
    EvaluationResult, FeatureKey, FeatureVector, Flow, Form, FormState, Metric, ModelKind,
    PredictionResult, Result, ResultState, ValidationError, ViewMode,
};
