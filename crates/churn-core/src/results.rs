//! Results from the prediction service and the text they render to

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub churn: bool,
    /// Payload as received, for developer inspection
    pub raw: Value,
}

impl PredictionResult {
    pub fn new(churn: bool, raw: Value) -> Self {
        Self { churn, raw }
    }

    pub fn label(&self) -> &'static str {
        if self.churn {
            "Churn"
        } else {
            "No Churn"
        }
    }
}

/// Service-defined evaluation payload, shown verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationResult(pub Value);

/// Predictions in input row order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub predictions: Vec<PredictionResult>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    Evaluation,
    SinglePrediction,
    BatchPrediction,
}

impl Flow {
    pub fn label(&self) -> &'static str {
        match self {
            Flow::Evaluation => "evaluation",
            Flow::SinglePrediction => "prediction",
            Flow::BatchPrediction => "bulk prediction",
        }
    }
}

/// Latest result per flow plus which flow completed last
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultState {
    pub evaluation: Option<EvaluationResult>,
    pub prediction: Option<PredictionResult>,
    pub batch: Option<BatchResult>,
    pub last: Option<Flow>,
}

impl ResultState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_evaluation(&mut self, result: EvaluationResult) {
        self.evaluation = Some(result);
        self.last = Some(Flow::Evaluation);
    }

    pub fn set_prediction(&mut self, result: PredictionResult) {
        self.prediction = Some(result);
        self.last = Some(Flow::SinglePrediction);
    }

    pub fn set_batch(&mut self, result: BatchResult) {
        self.batch = Some(result);
        self.last = Some(Flow::BatchPrediction);
    }

    pub fn is_set(&self) -> bool {
        self.last.is_some()
    }

    /// Rendered text for the most recently completed flow
    pub fn render(&self) -> Option<String> {
        self.render_flow(self.last?)
    }

    pub fn render_flow(&self, flow: Flow) -> Option<String> {
        match flow {
            Flow::Evaluation => self.evaluation.as_ref().map(render_evaluation),
            Flow::SinglePrediction => self.prediction.as_ref().map(render_prediction),
            Flow::BatchPrediction => self.batch.as_ref().map(|b| render_batch(b).join("\n")),
        }
    }
}

pub fn render_evaluation(result: &EvaluationResult) -> String {
    serde_json::to_string_pretty(&result.0).unwrap_or_else(|_| result.0.to_string())
}

pub fn render_prediction(result: &PredictionResult) -> String {
    let text = if result.churn { "True" } else { "False" };
    text.to_string()
}

pub fn render_batch(result: &BatchResult) -> Vec<String> {
    result
        .predictions
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Customer {}: {}", i + 1, p.label()))
        .collect()
}
